//! Asynchronous fan-out of a registry onto a worker pool.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::WorkId;
use crate::pool::WorkerPool;

use super::Registry;

/// Turns one notification into one queued work item per subscriber.
///
/// Holds a shared handle to a pool it does not own: it never shuts the pool
/// down or joins it.
#[derive(Debug, Clone)]
pub struct AsyncDispatcher {
    pool: Arc<WorkerPool>,
}

impl AsyncDispatcher {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Queue every subscriber of `registry`, in registration order, and
    /// return without waiting for any of them to run.
    ///
    /// Queue order follows registration order; completion order does not.
    ///
    /// # Errors
    ///
    /// If the pool is closed part way, returns [`Error::Dispatch`] naming the
    /// subscriber that was refused and how many were queued before it. Those
    /// earlier items stay queued and still run; later subscribers are not
    /// attempted.
    pub fn dispatch(&self, registry: &Registry) -> Result<Vec<WorkId>> {
        let subscribers = registry.snapshot();
        let total = subscribers.len();
        let mut queued = Vec::with_capacity(total);

        for (subscriber, callback) in subscribers {
            debug!(subscriber = %subscriber, "enqueuing");
            match self.pool.submit(move || callback()) {
                Ok(id) => queued.push(id),
                Err(e) => {
                    return Err(Error::Dispatch {
                        subscriber,
                        queued: queued.len(),
                        total,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(queued)
    }
}
