//! Subscriber registry and its asynchronous fan-out.
//!
//! Two layers, kept apart so subscription bookkeeping knows nothing about
//! scheduling:
//!
//! ```text
//!   emit() ──► AsyncDispatcher ──► snapshot of Registry (in order)
//!                                      │
//!                    ┌─────────────────┼─────────────────┐
//!                    ▼                 ▼                 ▼
//!               submit(sub1)      submit(sub2)      submit(subN)   ──► WorkerPool
//! ```
//!
//! [`Registry::invoke_all`] is the synchronous path; [`AsyncDispatcher::dispatch`]
//! is the fire-and-forget one. [`AsyncSignal`] pairs an owned registry with a
//! dispatcher.

mod dispatch;
mod registry;

pub use dispatch::AsyncDispatcher;
pub use registry::{InvokeSummary, Registry, Subscriber};

use std::sync::Arc;

use crate::diag::Log;
use crate::error::Result;
use crate::model::{SubscriberId, WorkId};
use crate::pool::WorkerPool;

/// A registry whose notifications run on a worker pool.
pub struct AsyncSignal {
    registry: Registry,
    dispatcher: AsyncDispatcher,
}

impl AsyncSignal {
    pub fn new(pool: Arc<WorkerPool>, log: Arc<dyn Log>) -> Self {
        Self {
            registry: Registry::new(log),
            dispatcher: AsyncDispatcher::new(pool),
        }
    }

    pub fn connect<F>(&self, subscriber: F) -> SubscriberId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.connect(subscriber)
    }

    pub fn disconnect(&self, id: SubscriberId) -> bool {
        self.registry.disconnect(id)
    }

    /// Queue every subscriber and return immediately.
    pub fn emit(&self) -> Result<Vec<WorkId>> {
        self.dispatcher.dispatch(&self.registry)
    }

    /// Call every subscriber on this thread instead.
    pub fn emit_sync(&self) -> InvokeSummary {
        self.registry.invoke_all()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &AsyncDispatcher {
        &self.dispatcher
    }
}
