use tracing::{Span, field};

use super::TraceId;

/// Root span for one unit of work (a scheduler cycle).
///
/// `outcome` is left empty and recorded once the cycle finishes.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id,
        outcome = field::Empty
    )
}

/// Child span; inherits `trace_id` from the enclosing root span.
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name)
}
