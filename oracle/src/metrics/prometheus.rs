//! Prometheus text exposition of the oracle gauges.

use std::fmt::Write;

use crate::metrics::counters::TelemetrySnapshot;

/// Renders one snapshot into the Prometheus text format (version 0.0.4).
pub fn render_prometheus(s: &TelemetrySnapshot) -> String {
    let mut out = String::new();

    gauge(
        &mut out,
        "gas_oracle_current_scalar",
        "Current scalar value from SystemConfig contract",
        s.current_scalar,
    );
    gauge(
        &mut out,
        "gas_oracle_target_scalar",
        "Calculated target scalar value",
        s.target_scalar,
    );
    gauge(
        &mut out,
        "gas_oracle_eth_price_usd",
        "Current ETH price in USD",
        s.reference_price_usd,
    );
    gauge(
        &mut out,
        "gas_oracle_token_price_usd",
        "Current fee token price in USD",
        s.target_price_usd,
    );
    counter(
        &mut out,
        "gas_oracle_scalar_updates_total",
        "Total number of scalar updates sent to L1",
        s.updates_total,
    );
    counter(
        &mut out,
        "gas_oracle_scalar_updates_success_total",
        "Total number of successful scalar updates",
        s.updates_success_total,
    );
    counter(
        &mut out,
        "gas_oracle_scalar_updates_failure_total",
        "Total number of failed scalar updates",
        s.updates_failure_total,
    );
    gauge(
        &mut out,
        "gas_oracle_last_update_timestamp",
        "Unix timestamp of the last successful scalar update",
        s.last_update_timestamp as f64,
    );
    counter(
        &mut out,
        "gas_oracle_cycles_total",
        "Total number of oracle cycles run",
        s.cycles_total,
    );
    counter(
        &mut out,
        "gas_oracle_cycle_errors_total",
        "Total number of cycles that ended in an error",
        s.cycle_errors_total,
    );

    out
}

fn gauge(out: &mut String, name: &str, help: &str, value: f64) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} gauge");
    let _ = writeln!(out, "{name} {value}");
}

fn counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
}
