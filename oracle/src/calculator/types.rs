use thiserror::Error;

/// Default gate: update only when the target moved at least 5%.
pub const DEFAULT_UPDATE_THRESHOLD_PERCENT: f64 = 5.0;
/// Default DA discount: data availability costs 10% of the L1 price.
pub const DEFAULT_DA_FACTOR: f64 = 0.1;
/// Default sequencer margin on top of the cost estimate.
pub const DEFAULT_SAFETY_MARGIN: f64 = 1.1;
/// Circuit-breaker floor.
pub const DEFAULT_MIN_SCALAR: u128 = 100_000;
/// Circuit-breaker ceiling.
pub const DEFAULT_MAX_SCALAR: u128 = 10_000_000_000;

/// Fixed-point base of the on-chain scalar (1.0 == 1_000_000).
pub const SCALAR_PRECISION: f64 = 1_000_000.0;

/// Formula and gate parameters, fixed for the lifetime of the process.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarConfig {
    /// DA discount factor. `None` disables the discount step (factor 1.0).
    pub da_factor: Option<f64>,

    /// Multiplier applied after the discount to leave the sequencer a margin.
    pub safety_margin: f64,

    /// Minimum relative change (percent, inclusive) that triggers an update.
    pub update_threshold_percent: f64,

    pub min_scalar: u128,
    pub max_scalar: u128,
}

impl ScalarConfig {
    pub fn effective_da_factor(&self) -> f64 {
        self.da_factor.unwrap_or(1.0)
    }
}

impl Default for ScalarConfig {
    fn default() -> Self {
        Self {
            da_factor: Some(DEFAULT_DA_FACTOR),
            safety_margin: DEFAULT_SAFETY_MARGIN,
            update_threshold_percent: DEFAULT_UPDATE_THRESHOLD_PERCENT,
            min_scalar: DEFAULT_MIN_SCALAR,
            max_scalar: DEFAULT_MAX_SCALAR,
        }
    }
}

/// Circuit-breaker override applied to the raw formula output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClampNotice {
    BelowMinimum { raw_target: f64, min_scalar: u128 },
    AboveMaximum { raw_target: f64, max_scalar: u128 },
}

/// Outcome of one calculation. Never carried over into the next cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarDecision {
    /// Scalar read from chain state in this cycle.
    pub current_scalar: u128,

    /// Formula output after truncation and clamping.
    pub target_scalar: u128,

    /// Formula output before truncation and clamping.
    pub raw_target: f64,

    /// `|target - current| / current * 100`; infinite when current is zero.
    pub change_percent: f64,

    pub should_update: bool,

    pub notice: Option<ClampNotice>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("target price must be positive, got {target_price}")]
    InvalidPrice { target_price: f64 },
}
