//! Chain access for the `SystemConfig` contract.
//!
//! The submitter and the scheduler only see the [`ChainClient`] and
//! [`Signer`] traits; RPC transport, ABI encoding and key handling stay
//! behind them.

pub mod alloy_client;
pub mod signer;

use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use thiserror::Error;

pub use alloy_client::AlloyChainClient;
pub use signer::{OperatorSigner, Signer, SigningError, TxAuthorization};

/// Inclusion status of a mined transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InclusionReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    /// `false` when the transaction was included but reverted.
    pub success: bool,
}

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("pending transaction failed: {0}")]
    Pending(#[from] alloy::providers::PendingTransactionError),

    #[error("on-chain scalar {0} does not fit in 128 bits")]
    ScalarOutOfRange(U256),

    #[error("receipt for {0} has no block number")]
    MissingBlock(TxHash),

    #[error("invalid rpc url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Reads and writes against one `SystemConfig` deployment.
///
/// Timeouts are the implementation's business: every call eventually
/// returns success or failure.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Chain id reported by the node.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Current `overhead`, carried through unchanged by updates.
    async fn overhead(&self) -> Result<U256, ChainError>;

    /// Current `scalar`.
    async fn scalar(&self) -> Result<u128, ChainError>;

    /// Signs and broadcasts `setGasConfig(overhead, scalar)`.
    async fn send_gas_config(
        &self,
        auth: &TxAuthorization,
        overhead: U256,
        scalar: u128,
    ) -> Result<TxHash, ChainError>;

    /// Blocks until `tx_hash` is included in a block, or the wait fails.
    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<InclusionReceipt, ChainError>;
}
