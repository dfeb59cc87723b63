use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::price::aggregator::PriceSource;
use crate::price::errors::PriceError;
use crate::price::types::{PriceQuote, TickerPrice};

/// Public ticker API (Binance-compatible `/api/v3/ticker/price`).
#[derive(Clone)]
pub struct TickerClient {
    http: Client,
    url: String,
}

impl TickerClient {
    pub fn new(url: String) -> Result<Self, PriceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    #[instrument(skip(self), fields(symbol = %symbol), level = "debug")]
    pub async fn fetch_ticker(&self, symbol: &str) -> Result<TickerPrice, PriceError> {
        let url = format!("{}/api/v3/ticker/price", self.url);

        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await?
            .error_for_status()?;

        let ticker: TickerPrice = resp.json().await?;

        debug!(price = %ticker.price, "ticker fetched");

        Ok(ticker)
    }
}

#[async_trait]
impl PriceSource for TickerClient {
    async fn quote(&self, symbol: &str) -> Result<PriceQuote, PriceError> {
        let ticker = self.fetch_ticker(symbol).await?;
        parse_ticker(symbol, ticker)
    }
}

/// Converts the ticker's decimal string into a finite, positive USD price.
pub fn parse_ticker(symbol: &str, ticker: TickerPrice) -> Result<PriceQuote, PriceError> {
    if !ticker.symbol.eq_ignore_ascii_case(symbol) {
        return Err(PriceError::SymbolMismatch {
            expected: symbol.to_string(),
            got: ticker.symbol,
        });
    }

    let usd_price = ticker
        .price
        .trim()
        .parse::<f64>()
        .ok()
        // "NaN" and "inf" parse, but are not prices. Halted pairs quote zero.
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| PriceError::Parse {
            symbol: symbol.to_string(),
            raw: ticker.price.clone(),
        })?;

    Ok(PriceQuote {
        symbol: symbol.to_string(),
        usd_price,
    })
}
