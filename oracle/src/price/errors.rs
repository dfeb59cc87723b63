use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unparseable price {raw:?} for {symbol}")]
    Parse { symbol: String, raw: String },

    #[error("ticker answered for {got} while {expected} was requested")]
    SymbolMismatch { expected: String, got: String },

    #[error("{symbol} quoted at {price}, prices must be positive")]
    NotPositive { symbol: String, price: f64 },
}
