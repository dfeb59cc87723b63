//! Update submission for the `SystemConfig` scalar.
//!
//! Invariants:
//! - at most one write per submission, and none when the decision is gated out;
//! - no retry: a failed attempt is reported and the next cycle starts over;
//! - every attempt ends in exactly one [`types::UpdateOutcome`].

pub mod submitter;
pub mod types;

pub use submitter::UpdateSubmitter;
pub use types::{FailureStage, GasConfigReading, SkipReason, UpdateOutcome};
