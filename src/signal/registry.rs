//! Ordered subscriber registry with synchronous invocation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::diag::Log;
use crate::error::Error;
use crate::model::SubscriberId;
use crate::pool::worker::panic_message;

/// A registered callback. Shared so each fan-out item can own a clone.
pub type Subscriber = Arc<dyn Fn() + Send + Sync + 'static>;

/// Result of one [`Registry::invoke_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeSummary {
    pub invoked: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Slots {
    next_id: u64,
    entries: Vec<(SubscriberId, Subscriber)>,
}

/// Subscribers in registration order.
///
/// Duplicate registrations are kept and invoked once per registration.
/// Nothing is ever removed except by [`disconnect`](Self::disconnect).
pub struct Registry {
    slots: Mutex<Slots>,
    log: Arc<dyn Log>,
}

impl Registry {
    pub fn new(log: Arc<dyn Log>) -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            log,
        }
    }

    /// Append a subscriber. The returned id can be passed to `disconnect`.
    pub fn connect<F>(&self, subscriber: F) -> SubscriberId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.connect_shared(Arc::new(subscriber))
    }

    /// Append an already shared subscriber.
    pub fn connect_shared(&self, subscriber: Subscriber) -> SubscriberId {
        let mut slots = self.lock();
        let id = SubscriberId(slots.next_id);
        slots.next_id += 1;
        slots.entries.push((id, subscriber));
        debug!(subscriber = %id, "subscriber connected");
        id
    }

    /// Remove one registration. Returns false if `id` is unknown.
    pub fn disconnect(&self, id: SubscriberId) -> bool {
        let mut slots = self.lock();
        let before = slots.entries.len();
        slots.entries.retain(|(entry, _)| *entry != id);
        before != slots.entries.len()
    }

    /// Current subscribers in registration order.
    pub fn snapshot(&self) -> Vec<(SubscriberId, Subscriber)> {
        self.lock().entries.clone()
    }

    /// Call every subscriber on this thread, in order.
    ///
    /// A panicking subscriber is logged and skipped; the rest still run.
    /// Subscribers may connect or disconnect during the pass; changes take
    /// effect on the next call.
    pub fn invoke_all(&self) -> InvokeSummary {
        let mut summary = InvokeSummary::default();
        for (id, subscriber) in self.snapshot() {
            summary.invoked += 1;
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| subscriber())) {
                summary.failed += 1;
                let err = Error::SubscriberFailed {
                    id,
                    message: panic_message(payload.as_ref()),
                };
                self.log.log(&err.to_string());
            }
        }
        summary
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
