//! Scalar calculator.
//!
//! Turns a price pair into the scalar the `SystemConfig` contract should hold:
//!
//! ```text
//! raw_target = (reference_usd / target_usd) * 1_000_000 * da_factor * safety_margin
//! ```
//!
//! The result is truncated toward zero, clamped into the circuit-breaker
//! bounds and compared against the live on-chain scalar. This module has no
//! I/O and no state: identical inputs always give identical decisions.

pub mod types;

use tracing::{debug, warn};

pub use types::{CalcError, ClampNotice, SCALAR_PRECISION, ScalarConfig, ScalarDecision};

/// Computes the target scalar and whether it warrants an on-chain update.
///
/// `current_scalar == 0` always yields `should_update = true`.
pub fn compute_decision(
    reference_price: f64,
    target_price: f64,
    current_scalar: u128,
    config: &ScalarConfig,
) -> Result<ScalarDecision, CalcError> {
    // Also rejects NaN.
    if !(target_price > 0.0) {
        return Err(CalcError::InvalidPrice { target_price });
    }

    let ratio = reference_price / target_price;
    let raw_target =
        ratio * SCALAR_PRECISION * config.effective_da_factor() * config.safety_margin;

    let (target_scalar, notice) = clamp_target(raw_target, config);

    match notice {
        Some(ClampNotice::BelowMinimum { min_scalar, .. }) => warn!(
            raw_target,
            min_scalar = %min_scalar,
            "target scalar below minimum, using minimum"
        ),
        Some(ClampNotice::AboveMaximum { max_scalar, .. }) => warn!(
            raw_target,
            max_scalar = %max_scalar,
            "target scalar above maximum, using maximum"
        ),
        None => {}
    }

    let change_percent = change_percent(current_scalar, target_scalar);
    let should_update = change_percent >= config.update_threshold_percent;

    debug!(
        reference_price,
        target_price,
        ratio,
        da_factor = config.effective_da_factor(),
        safety_margin = config.safety_margin,
        raw_target,
        target_scalar = %target_scalar,
        current_scalar = %current_scalar,
        change_percent,
        should_update,
        "scalar decision computed"
    );

    Ok(ScalarDecision {
        current_scalar,
        target_scalar,
        raw_target,
        change_percent,
        should_update,
        notice,
    })
}

/// Truncates toward zero and applies the circuit breaker.
///
/// Non-finite or negative formula output lands on the floor.
fn clamp_target(raw_target: f64, config: &ScalarConfig) -> (u128, Option<ClampNotice>) {
    let truncated = raw_target.trunc();

    if !(truncated >= config.min_scalar as f64) {
        return (
            config.min_scalar,
            Some(ClampNotice::BelowMinimum {
                raw_target,
                min_scalar: config.min_scalar,
            }),
        );
    }

    if truncated > config.max_scalar as f64 {
        return (
            config.max_scalar,
            Some(ClampNotice::AboveMaximum {
                raw_target,
                max_scalar: config.max_scalar,
            }),
        );
    }

    // f64 -> u128 saturates; the bounds above keep it in range anyway.
    let target = (truncated as u128).clamp(config.min_scalar, config.max_scalar);
    (target, None)
}

/// Relative distance between the on-chain and the target scalar, in percent.
///
/// A zero on-chain scalar is anomalous and always reads as an infinite change.
pub fn change_percent(current_scalar: u128, target_scalar: u128) -> f64 {
    if current_scalar == 0 {
        return f64::INFINITY;
    }

    let diff = current_scalar.abs_diff(target_scalar) as f64;
    diff / current_scalar as f64 * 100.0
}
