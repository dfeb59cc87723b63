pub mod counters;
pub mod prometheus;
pub mod server;

pub use counters::{Telemetry, TelemetryReader, TelemetrySnapshot};
