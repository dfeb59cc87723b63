use std::time::Duration;

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::sol;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::chain::signer::TxAuthorization;
use crate::chain::{ChainClient, ChainError, InclusionReceipt};

sol! {
    /// Gas configuration surface of the OP-stack `SystemConfig` contract.
    #[sol(rpc)]
    interface ISystemConfig {
        function overhead() external view returns (uint256);
        function scalar() external view returns (uint256);
        function setGasConfig(uint256 _overhead, uint256 _scalar) external;
    }
}

/// JSON-RPC client for one `SystemConfig` deployment.
#[derive(Clone)]
pub struct AlloyChainClient {
    url: Url,
    provider: DynProvider,
    contract: Address,
    confirmation_timeout: Duration,
}

impl AlloyChainClient {
    /// Builds the read provider. No request is made until the first call.
    pub fn connect(
        rpc_url: &str,
        contract: Address,
        confirmation_timeout: Duration,
    ) -> Result<Self, ChainError> {
        let url = rpc_url
            .parse::<Url>()
            .map_err(|e| ChainError::InvalidUrl {
                url: rpc_url.to_string(),
                reason: e.to_string(),
            })?;

        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();

        Ok(Self {
            url,
            provider,
            contract,
            confirmation_timeout,
        })
    }

    pub fn contract(&self) -> Address {
        self.contract
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_chain_id().await?)
    }

    #[instrument(skip(self), fields(contract = %self.contract), level = "debug")]
    async fn overhead(&self) -> Result<U256, ChainError> {
        let contract = ISystemConfig::new(self.contract, self.provider.clone());
        let overhead = contract.overhead().call().await?;

        debug!(overhead = %overhead, "overhead read");
        Ok(overhead)
    }

    #[instrument(skip(self), fields(contract = %self.contract), level = "debug")]
    async fn scalar(&self) -> Result<u128, ChainError> {
        let contract = ISystemConfig::new(self.contract, self.provider.clone());
        let raw = contract.scalar().call().await?;

        debug!(scalar = %raw, "scalar read");
        u128::try_from(raw).map_err(|_| ChainError::ScalarOutOfRange(raw))
    }

    #[instrument(
        skip(self, auth),
        fields(contract = %self.contract, from = %auth.from, chain_id = auth.chain_id),
        level = "debug"
    )]
    async fn send_gas_config(
        &self,
        auth: &TxAuthorization,
        overhead: U256,
        scalar: u128,
    ) -> Result<TxHash, ChainError> {
        // Fillers resolve nonce, gas and fees; the wallet signs.
        let signing_provider = ProviderBuilder::new()
            .wallet(auth.wallet().clone())
            .connect_http(self.url.clone());

        let contract = ISystemConfig::new(self.contract, signing_provider);
        let pending = contract
            .setGasConfig(overhead, U256::from(scalar))
            .from(auth.from)
            .send()
            .await?;

        Ok(*pending.tx_hash())
    }

    #[instrument(skip(self), fields(timeout_s = self.confirmation_timeout.as_secs()), level = "debug")]
    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<InclusionReceipt, ChainError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(1)
            .with_timeout(Some(self.confirmation_timeout))
            .get_receipt()
            .await?;

        let block_number = receipt
            .block_number()
            .ok_or(ChainError::MissingBlock(tx_hash))?;

        Ok(InclusionReceipt {
            tx_hash,
            block_number,
            gas_used: receipt.gas_used(),
            success: receipt.status(),
        })
    }
}
