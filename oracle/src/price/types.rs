use serde::Deserialize;

/// Response of `GET /api/v3/ticker/price?symbol=...`.
#[derive(Debug, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    /// Decimal string, e.g. `"3012.45000000"`.
    pub price: String,
}

/// One USD price, fetched fresh for a single cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    pub usd_price: f64,
}

/// Both prices a cycle needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePair {
    /// L1 gas asset (ETH).
    pub reference: PriceQuote,
    /// L2 fee token.
    pub target: PriceQuote,
}
