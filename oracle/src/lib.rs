pub mod calculator;
pub mod chain;
pub mod config;
pub mod execution;
pub mod metrics;
pub mod price;
pub mod scheduler;

pub mod error;
pub mod logger;
pub mod time;
