pub mod aggregator;
pub mod client;
pub mod errors;
pub mod types;

pub use aggregator::{FixedPriceSource, PriceAggregator, PriceSource};
pub use client::TickerClient;
pub use errors::PriceError;
pub use types::*;
