use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::execution::types::UpdateOutcome;

/// Shared cells. Floats are stored as their bit pattern.
#[derive(Default)]
struct Cells {
    current_scalar: AtomicU64,
    target_scalar: AtomicU64,
    reference_price: AtomicU64,
    target_price: AtomicU64,

    updates_total: AtomicU64,
    updates_success: AtomicU64,
    updates_failure: AtomicU64,
    last_update_ts: AtomicU64,

    cycles_total: AtomicU64,
    cycle_errors: AtomicU64,
}

impl Cells {
    fn store_f64(cell: &AtomicU64, v: f64) {
        cell.store(v.to_bits(), Ordering::Relaxed);
    }

    fn load_f64(cell: &AtomicU64) -> f64 {
        f64::from_bits(cell.load(Ordering::Relaxed))
    }

    fn inc(cell: &AtomicU64) {
        cell.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of every gauge and counter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub current_scalar: f64,
    pub target_scalar: f64,
    pub reference_price_usd: f64,
    pub target_price_usd: f64,

    pub updates_total: u64,
    pub updates_success_total: u64,
    pub updates_failure_total: u64,
    /// Unix seconds of the last confirmed update; 0 if none yet.
    pub last_update_timestamp: u64,

    pub cycles_total: u64,
    pub cycle_errors_total: u64,
}

/// Write side of the oracle's gauges. Owned by the scheduler loop.
///
/// Deliberately not `Clone`: there is exactly one writer. Readers get a
/// [`TelemetryReader`].
#[derive(Default)]
pub struct Telemetry {
    cells: Arc<Cells>,
}

/// Read-only handle for the metrics endpoint.
#[derive(Clone)]
pub struct TelemetryReader {
    cells: Arc<Cells>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reader(&self) -> TelemetryReader {
        TelemetryReader {
            cells: Arc::clone(&self.cells),
        }
    }

    pub fn record_prices(&mut self, reference_usd: f64, target_usd: f64) {
        Cells::store_f64(&self.cells.reference_price, reference_usd);
        Cells::store_f64(&self.cells.target_price, target_usd);
    }

    pub fn record_scalars(&mut self, current: u128, target: u128) {
        Cells::store_f64(&self.cells.current_scalar, current as f64);
        Cells::store_f64(&self.cells.target_scalar, target as f64);
    }

    pub fn record_cycle(&mut self) {
        Cells::inc(&self.cells.cycles_total);
    }

    pub fn record_cycle_error(&mut self) {
        Cells::inc(&self.cells.cycle_errors);
    }

    /// Applies the counter semantics for one submission outcome.
    pub fn record_outcome(&mut self, outcome: &UpdateOutcome, now_secs: u64) {
        if outcome.attempted_send() {
            Cells::inc(&self.cells.updates_total);
        }

        match outcome {
            UpdateOutcome::Confirmed { .. } => {
                Cells::inc(&self.cells.updates_success);
                self.cells.last_update_ts.store(now_secs, Ordering::Relaxed);
            }
            UpdateOutcome::Reverted { .. } => Cells::inc(&self.cells.updates_failure),
            UpdateOutcome::Failed { .. } if outcome.attempted_send() => {
                Cells::inc(&self.cells.updates_failure)
            }
            _ => {}
        }
    }
}

impl TelemetryReader {
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let c = &self.cells;
        TelemetrySnapshot {
            current_scalar: Cells::load_f64(&c.current_scalar),
            target_scalar: Cells::load_f64(&c.target_scalar),
            reference_price_usd: Cells::load_f64(&c.reference_price),
            target_price_usd: Cells::load_f64(&c.target_price),
            updates_total: c.updates_total.load(Ordering::Relaxed),
            updates_success_total: c.updates_success.load(Ordering::Relaxed),
            updates_failure_total: c.updates_failure.load(Ordering::Relaxed),
            last_update_timestamp: c.last_update_ts.load(Ordering::Relaxed),
            cycles_total: c.cycles_total.load(Ordering::Relaxed),
            cycle_errors_total: c.cycle_errors.load(Ordering::Relaxed),
        }
    }
}
