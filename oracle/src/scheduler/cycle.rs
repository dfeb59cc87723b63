//! Fixed-cadence oracle loop.
//!
//! Responsibilities:
//! - Run Aggregator → Calculator → Submitter once per tick, first tick at startup.
//! - Catch every per-cycle error at the cycle boundary and keep looping.
//! - Own the single write handle of the telemetry.
//!
//! Cycles never overlap: a slow submission delays the next tick instead of
//! running next to it, so at most one transaction from this agent is in
//! flight. Nothing computed in one cycle is reused by the next.

use std::time::Duration;

use common::logger::{TraceId, child_span, root_span};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, error, info, warn};

use crate::calculator::{ScalarConfig, compute_decision};
use crate::chain::{ChainClient, Signer};
use crate::error::AppError;
use crate::execution::{UpdateOutcome, UpdateSubmitter};
use crate::logger::{annotate_outcome, warn_if_slow};
use crate::metrics::Telemetry;
use crate::price::PriceAggregator;
use crate::time::now_secs;

/// Submissions slower than this are flagged in the logs.
const SLOW_SUBMISSION: Duration = Duration::from_secs(60);

pub struct UpdateCycle<C: ChainClient, S: Signer> {
    prices: PriceAggregator,
    submitter: UpdateSubmitter<C, S>,
    config: ScalarConfig,
    telemetry: Telemetry,
}

impl<C: ChainClient, S: Signer> UpdateCycle<C, S> {
    pub fn new(
        prices: PriceAggregator,
        submitter: UpdateSubmitter<C, S>,
        config: ScalarConfig,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            prices,
            submitter,
            config,
            telemetry,
        }
    }

    /// One full pipeline pass.
    ///
    /// Price and calculator errors are returned; contract reads and
    /// everything after them come back as an `UpdateOutcome`.
    pub async fn run_once(&mut self) -> Result<UpdateOutcome, AppError> {
        let prices = self.prices.get_prices().await?;
        self.telemetry
            .record_prices(prices.reference.usd_price, prices.target.usd_price);

        // READ: live every cycle, never cached.
        let reading = match self.submitter.read().await {
            Ok(r) => r,
            Err(outcome) => {
                self.telemetry.record_outcome(&outcome, now_secs());
                return Ok(outcome);
            }
        };

        let decision = compute_decision(
            prices.reference.usd_price,
            prices.target.usd_price,
            reading.scalar,
            &self.config,
        )?;
        self.telemetry
            .record_scalars(decision.current_scalar, decision.target_scalar);

        info!(
            current = %decision.current_scalar,
            target = %decision.target_scalar,
            change_percent = decision.change_percent,
            threshold_percent = self.config.update_threshold_percent,
            "scalar analysis"
        );

        if decision.should_update {
            info!("update required, preparing transaction");
        } else {
            info!("scalar is stable, no update needed");
        }

        let submit = self.submitter.submit(&reading, &decision);
        let outcome = warn_if_slow("submit_update", SLOW_SUBMISSION, submit)
            .instrument(child_span("submit_update"))
            .await;

        self.telemetry.record_outcome(&outcome, now_secs());
        Ok(outcome)
    }

    /// Runs one cycle in its own root span and logs how it ended.
    pub async fn tick(&mut self) -> Result<UpdateOutcome, AppError> {
        let trace_id = TraceId::new();
        let span = root_span("oracle_cycle", &trace_id);

        let result = self.run_once().instrument(span.clone()).await;
        self.telemetry.record_cycle();

        match &result {
            Ok(outcome) => {
                annotate_outcome(&span, outcome.label());
                if let Some(err) = outcome.to_error() {
                    self.telemetry.record_cycle_error();
                    warn!(parent: &span, kind = err.kind(), error = %err, "cycle ended without an update");
                }
            }
            Err(err) => {
                annotate_outcome(&span, err.kind());
                self.telemetry.record_cycle_error();
                error!(parent: &span, kind = err.kind(), error = %err, "cycle aborted");
            }
        }

        result
    }

    /// Ticks every `every` until `shutdown` flips. The first cycle runs
    /// immediately; a shutdown request lets the running cycle finish.
    pub async fn run(mut self, every: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(every_s = every.as_secs(), "oracle loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            if *shutdown.borrow() {
                break;
            }

            // Per-cycle errors were logged in `tick`.
            let _ = self.tick().await;
        }

        info!("oracle loop stopped");
    }
}
