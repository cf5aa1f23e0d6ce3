//! The shared work queue.
//!
//! One mutex guards the pending items, the pool phase and the number of live
//! consumers; one condition variable wakes consumers when work arrives or
//! draining starts. Every phase change happens under that mutex, so a
//! consumer that observes "draining and empty" and a producer pushing an item
//! can never both succeed: either the push lands first and the consumer
//! takes it, or the last consumer closes the queue first and the push fails.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::model::{Phase, WorkId};

use super::worker::WorkerState;

/// Outcome of a job. `Err` is reported as a work item failure.
pub(crate) type JobResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub(crate) type Job = Box<dyn FnOnce() -> JobResult + Send + 'static>;

/// A queued deferred action. Owns everything it captured.
pub(crate) struct WorkItem {
    pub(crate) id: WorkId,
    pub(crate) job: Job,
}

struct QueueState {
    items: VecDeque<WorkItem>,
    phase: Phase,
    /// Threads currently inside the consume loop (workers, or a caller in `join`).
    consumers: usize,
}

pub(crate) struct WorkQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl WorkQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                phase: Phase::Running,
                consumers: 0,
            }),
            available: Condvar::new(),
        }
    }

    /// Append to the tail and wake one waiting consumer.
    pub(crate) fn push(&self, item: WorkItem) -> Result<()> {
        let mut state = self.lock();
        if !state.phase.accepts_work() {
            return Err(Error::PoolClosed);
        }
        state.items.push_back(item);
        self.available.notify_one();
        Ok(())
    }

    /// Take the head item without blocking.
    pub(crate) fn try_pop(&self) -> Option<WorkItem> {
        self.lock().items.pop_front()
    }

    /// Register a consumer. Must be paired with a later `next()` returning
    /// `Exit`, or with `retire()` if the consumer never started.
    pub(crate) fn enlist(&self) {
        self.lock().consumers += 1;
    }

    /// Deregister a consumer that never entered the loop.
    pub(crate) fn retire(&self) -> bool {
        let mut state = self.lock();
        Self::retire_locked(&mut state)
    }

    /// Block until there is an item to execute or the consumer should exit.
    ///
    /// Items are handed out even while draining; exit happens only when the
    /// queue is empty at the moment of re-check. Spurious wakeups loop back
    /// to waiting.
    pub(crate) fn next(&self) -> WorkerState {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return WorkerState::Execute(item);
            }
            if state.phase != Phase::Running {
                let closed_pool = Self::retire_locked(&mut state);
                return WorkerState::Exit { closed_pool };
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Running -> Draining. Wakes every consumer. Returns false if draining
    /// had already begun.
    pub(crate) fn begin_drain(&self) -> bool {
        let mut state = self.lock();
        if !state.phase.can_transition_to(Phase::Draining) {
            return false;
        }
        state.phase = Phase::Draining;
        self.available.notify_all();
        true
    }

    pub(crate) fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// The last consumer to leave a draining queue closes it.
    fn retire_locked(state: &mut QueueState) -> bool {
        state.consumers = state.consumers.saturating_sub(1);
        if state.consumers == 0 && state.phase.can_transition_to(Phase::Closed) {
            state.phase = Phase::Closed;
            return true;
        }
        false
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Jobs run outside this lock, so a poisoned guard still holds a consistent queue.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
