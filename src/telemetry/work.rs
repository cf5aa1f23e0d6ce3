//! Work execution span helpers.
//!
//! Provides span creation for queued items and events for pool phase changes.

use tracing::Span;

use crate::model::{Phase, WorkId};

/// Start a span for one work item's execution.
///
/// The `work.error` field is declared empty and filled by [`record_failure`].
pub fn start_work_span(work_id: &WorkId, worker: &str) -> Span {
    tracing::info_span!(
        "work.execute",
        "work.id" = %work_id,
        "work.worker" = worker,
        "work.error" = tracing::field::Empty,
    )
}

/// Mark the span as failed and emit a `warn` event inside it.
pub fn record_failure(span: &Span, message: &str) {
    span.record("work.error", message);
    span.in_scope(|| {
        tracing::warn!(error = message, "work_failed");
    });
}

/// Record a pool phase change.
pub fn record_phase_transition(from: Phase, to: Phase) {
    tracing::info!(from = %from, to = %to, "phase_transition");
}
