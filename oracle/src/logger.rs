use std::time::Duration;

use tracing::{Span, field};

/// Records the terminal label of the current cycle on its root span.
pub fn annotate_outcome(span: &Span, outcome: &str) {
    span.record("outcome", field::display(outcome));
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
