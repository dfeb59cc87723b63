use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::price::errors::PriceError;
use crate::price::types::{PricePair, PriceQuote};

/// Anything that can quote a USD price for a symbol.
///
/// Implementations perform at most one outbound request per call and never
/// cache: each cycle sees fresh prices.
#[async_trait]
pub trait PriceSource: Send + Sync + 'static {
    async fn quote(&self, symbol: &str) -> Result<PriceQuote, PriceError>;
}

/// Constant price, for tokens that are not listed anywhere yet.
#[derive(Clone, Debug)]
pub struct FixedPriceSource {
    usd_price: f64,
}

impl FixedPriceSource {
    pub fn new(usd_price: f64) -> Self {
        Self { usd_price }
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    async fn quote(&self, symbol: &str) -> Result<PriceQuote, PriceError> {
        Ok(PriceQuote {
            symbol: symbol.to_string(),
            usd_price: self.usd_price,
        })
    }
}

/// Fetches the reference (ETH) and target (fee token) prices for one cycle.
#[derive(Clone)]
pub struct PriceAggregator {
    reference: Arc<dyn PriceSource>,
    reference_symbol: String,
    target: Arc<dyn PriceSource>,
    target_symbol: String,
}

impl PriceAggregator {
    pub fn new(
        reference: Arc<dyn PriceSource>,
        reference_symbol: String,
        target: Arc<dyn PriceSource>,
        target_symbol: String,
    ) -> Self {
        Self {
            reference,
            reference_symbol,
            target,
            target_symbol,
        }
    }

    /// Both quotes or `PriceUnavailable` naming the symbol that failed.
    ///
    /// A quote that is not a finite positive number counts as a failure,
    /// whatever source produced it.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_prices(&self) -> Result<PricePair, AppError> {
        let reference = quote_or_unavailable(&*self.reference, &self.reference_symbol).await?;
        let target = quote_or_unavailable(&*self.target, &self.target_symbol).await?;

        info!(
            reference_symbol = %reference.symbol,
            reference_usd = reference.usd_price,
            target_symbol = %target.symbol,
            target_usd = target.usd_price,
            "prices fetched"
        );

        Ok(PricePair { reference, target })
    }
}

async fn quote_or_unavailable(
    source: &dyn PriceSource,
    symbol: &str,
) -> Result<PriceQuote, AppError> {
    let unavailable = |e| AppError::PriceUnavailable {
        symbol: symbol.to_string(),
        source: e,
    };

    let quote = source.quote(symbol).await.map_err(unavailable)?;
    if !(quote.usd_price.is_finite() && quote.usd_price > 0.0) {
        return Err(unavailable(PriceError::NotPositive {
            symbol: quote.symbol,
            price: quote.usd_price,
        }));
    }
    Ok(quote)
}
