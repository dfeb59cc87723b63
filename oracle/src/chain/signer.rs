use std::fmt;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::Signer as _;
use alloy::signers::local::PrivateKeySigner;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("invalid operator key: {0}")]
    InvalidKey(String),

    #[error("signer is pinned to chain {expected}, node reports chain {actual}")]
    ChainIdMismatch { expected: u64, actual: u64 },
}

/// Proof that the operator may send a transaction on one chain.
///
/// Holds a wallet bound to `chain_id`; key bytes are not reachable from here.
#[derive(Clone)]
pub struct TxAuthorization {
    pub from: Address,
    pub chain_id: u64,
    wallet: EthereumWallet,
}

impl TxAuthorization {
    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }
}

impl fmt::Debug for TxAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxAuthorization")
            .field("from", &self.from)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// Opaque credential capability.
pub trait Signer: Send + Sync + 'static {
    fn address(&self) -> Address;

    /// Produces an authorization for transactions on `chain_id`.
    fn authorize(&self, chain_id: u64) -> Result<TxAuthorization, SigningError>;
}

/// Local secp256k1 key of the `SystemConfig` owner.
pub struct OperatorSigner {
    inner: PrivateKeySigner,
    /// Chain the operator expects to talk to, if configured.
    pinned_chain_id: Option<u64>,
}

impl OperatorSigner {
    /// Parses a hex private key, with or without `0x`.
    pub fn from_hex(key: &str, pinned_chain_id: Option<u64>) -> Result<Self, SigningError> {
        let inner = key
            .trim()
            .parse::<PrivateKeySigner>()
            // The parse error never echoes the key.
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;

        Ok(Self {
            inner,
            pinned_chain_id,
        })
    }
}

impl fmt::Debug for OperatorSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSigner")
            .field("address", &self.inner.address())
            .field("pinned_chain_id", &self.pinned_chain_id)
            .finish_non_exhaustive()
    }
}

impl Signer for OperatorSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn authorize(&self, chain_id: u64) -> Result<TxAuthorization, SigningError> {
        if let Some(expected) = self.pinned_chain_id {
            if expected != chain_id {
                return Err(SigningError::ChainIdMismatch {
                    expected,
                    actual: chain_id,
                });
            }
        }

        let signer = self.inner.clone().with_chain_id(Some(chain_id));

        Ok(TxAuthorization {
            from: signer.address(),
            chain_id,
            wallet: EthereumWallet::from(signer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known anvil/hardhat account #0.
    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn parses_key_with_and_without_prefix() {
        let a = OperatorSigner::from_hex(KEY, None).unwrap();
        let b = OperatorSigner::from_hex(KEY.trim_start_matches("0x"), None).unwrap();

        assert_eq!(a.address(), b.address());
        assert_eq!(a.address(), ADDR.parse::<Address>().unwrap());
    }

    #[test]
    fn rejects_garbage_key() {
        let err = OperatorSigner::from_hex("not-a-key", None).unwrap_err();
        assert!(matches!(err, SigningError::InvalidKey(_)));
    }

    #[test]
    fn authorize_binds_chain_id() {
        let s = OperatorSigner::from_hex(KEY, None).unwrap();
        let auth = s.authorize(11_155_111).unwrap();

        assert_eq!(auth.chain_id, 11_155_111);
        assert_eq!(auth.from, s.address());
    }

    #[test]
    fn pinned_chain_mismatch_is_signing_error() {
        let s = OperatorSigner::from_hex(KEY, Some(1)).unwrap();
        assert_eq!(
            s.authorize(5).unwrap_err(),
            SigningError::ChainIdMismatch {
                expected: 1,
                actual: 5
            }
        );
        assert!(s.authorize(1).is_ok());
    }

    #[test]
    fn debug_output_hides_key() {
        let s = OperatorSigner::from_hex(KEY, None).unwrap();
        let dbg = format!("{s:?} {:?}", s.authorize(1).unwrap());
        assert!(!dbg.contains(KEY.trim_start_matches("0x")));
    }
}
