//! Error types for workfan.

use thiserror::Error;

use crate::model::{SubscriberId, WorkId};

#[derive(Debug, Error)]
pub enum Error {
    /// The pool drained and every consumer exited; nothing will run new work.
    #[error("worker pool is closed")]
    PoolClosed,

    /// A fan-out stopped part way. The first `queued` subscribers stay queued
    /// and will still run.
    #[error("dispatch to subscriber {subscriber} failed after queueing {queued} of {total}: {source}")]
    Dispatch {
        subscriber: SubscriberId,
        queued: usize,
        total: usize,
        #[source]
        source: Box<Error>,
    },

    /// A work item panicked or returned an error on a worker thread.
    /// Only ever logged; the submitter has already returned.
    #[error("work item {id} failed: {message}")]
    WorkItemFailed { id: WorkId, message: String },

    /// A subscriber panicked during synchronous invocation.
    #[error("subscriber {id} failed: {message}")]
    SubscriberFailed { id: SubscriberId, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
