//! Per-thread consume loop.
//!
//! ```text
//!          ┌──────── item ────────┐
//!          ▼                      │
//!   WAIT ──┴─► EXECUTE ──► WAIT   │
//!     │                           │
//!     └─ draining && empty ─► EXIT
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::Error;
use crate::model::Phase;
use crate::telemetry::work::{record_failure, record_phase_transition, start_work_span};

use super::Shared;
use super::queue::WorkItem;

pub(crate) enum WorkerState {
    /// Holding nothing; blocked until work or draining.
    Wait,
    /// Holding one item, already removed from the queue.
    Execute(WorkItem),
    /// Draining and the queue was empty on re-check.
    Exit { closed_pool: bool },
}

/// Drive one consumer until it exits. The caller must have enlisted it.
pub(crate) fn run(shared: &Shared, worker: &str) {
    debug!(worker, "worker started");
    let mut state = WorkerState::Wait;
    loop {
        state = match state {
            WorkerState::Wait => shared.queue.next(),
            WorkerState::Execute(item) => {
                execute(shared, item, worker);
                WorkerState::Wait
            }
            WorkerState::Exit { closed_pool } => {
                if closed_pool {
                    record_phase_transition(Phase::Draining, Phase::Closed);
                }
                break;
            }
        };
    }
    debug!(worker, "worker exited");
}

/// Run one item outside the queue lock. Panics and `Err` results are caught
/// here, logged, and counted; the item is never retried.
pub(crate) fn execute(shared: &Shared, item: WorkItem, worker: &str) {
    let WorkItem { id, job } = item;
    let span = start_work_span(&id, worker);
    let _entered = span.enter();

    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(job));
    shared.executed.fetch_add(1, Ordering::Relaxed);

    let message = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(payload) => Some(panic_message(payload.as_ref())),
    };
    shared
        .instruments
        .record_executed(started.elapsed(), message.is_some());

    let Some(message) = message else {
        return;
    };

    shared.failed.fetch_add(1, Ordering::Relaxed);
    record_failure(&span, &message);
    let err = Error::WorkItemFailed { id, message };
    shared.log.log(&err.to_string());
    info!(worker, "worker continuing after failed item");
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}
