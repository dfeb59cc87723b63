use thiserror::Error;

use crate::calculator::CalcError;
use crate::config::ConfigError;
use crate::price::PriceError;

/// Every failure the agent can observe, at startup or inside a cycle.
///
/// `Configuration` and startup `Connectivity` abort the process. Everything
/// else ends the current cycle only.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("price unavailable for {symbol}: {source}")]
    PriceUnavailable {
        symbol: String,
        #[source]
        source: PriceError,
    },

    #[error("invalid price: {0}")]
    InvalidPrice(#[from] CalcError),

    #[error("contract read failed: {0}")]
    ContractRead(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("confirmation failed: {0}")]
    Confirmation(String),

    #[error("transaction {tx_id} reverted on-chain")]
    OnChainRevert { tx_id: String },
}

impl AppError {
    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "configuration",
            AppError::Connectivity(_) => "connectivity",
            AppError::PriceUnavailable { .. } => "price_unavailable",
            AppError::InvalidPrice(_) => "invalid_price",
            AppError::ContractRead(_) => "contract_read",
            AppError::Signing(_) => "signing",
            AppError::Submission(_) => "submission",
            AppError::Confirmation(_) => "confirmation",
            AppError::OnChainRevert { .. } => "on_chain_revert",
        }
    }
}
