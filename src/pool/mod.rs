//! Fixed-size worker pool.
//!
//! The pool owns N threads and one [`WorkQueue`]. Owners submit closures,
//! request shutdown, then join:
//!
//! ```text
//! new(n) ──► RUNNING ── shutdown() ──► DRAINING ── last worker exits ──► CLOSED
//!              │                          │
//!           submit() ok               submit() ok                    submit() -> PoolClosed
//! ```
//!
//! `join()` returns once every worker has exited, which only happens after
//! shutdown and an empty queue. Every item accepted before that point has run.

mod queue;
pub(crate) mod worker;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::diag::Log;
use crate::error::{Error, Result};
use crate::model::{Phase, PoolMetrics, WorkId};
use crate::telemetry::metrics::PoolInstruments;
use crate::telemetry::work::record_phase_transition;

use queue::{Job, WorkItem, WorkQueue};

/// State shared between the pool handle and its worker threads.
pub(crate) struct Shared {
    pub(crate) queue: WorkQueue,
    pub(crate) log: Arc<dyn Log>,
    pub(crate) submitted: AtomicUsize,
    pub(crate) executed: AtomicUsize,
    pub(crate) failed: AtomicUsize,
    pub(crate) instruments: PoolInstruments,
}

/// A fixed set of threads draining one unbounded FIFO queue.
///
/// Share it behind an `Arc` with dispatchers or other submitters; only the
/// owner should call [`shutdown`](Self::shutdown) and [`join`](Self::join).
/// Dropping the last handle shuts down and joins.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl WorkerPool {
    /// Start `worker_count` threads with default naming.
    ///
    /// Zero is allowed: nothing runs in the background, and queued work is
    /// executed by [`run_pending`](Self::run_pending) or on the caller's
    /// thread inside [`join`](Self::join).
    pub fn new(worker_count: usize, log: Arc<dyn Log>) -> Result<Self> {
        Self::with_config(
            &PoolConfig {
                workers: worker_count,
                ..PoolConfig::default()
            },
            log,
        )
    }

    pub fn with_config(config: &PoolConfig, log: Arc<dyn Log>) -> Result<Self> {
        let shared = Arc::new(Shared {
            queue: WorkQueue::new(),
            log,
            submitted: AtomicUsize::new(0),
            executed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            instruments: PoolInstruments::new(&config.thread_name_prefix),
        });

        let mut handles = Vec::with_capacity(config.workers);
        for i in 0..config.workers {
            let name = format!("{}-{i}", config.thread_name_prefix);
            let thread_shared = Arc::clone(&shared);
            shared.queue.enlist();
            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker::run(&thread_shared, &name));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Undo the failed consumer, then wind down the ones already running.
                    shared.queue.retire();
                    shared.queue.begin_drain();
                    for handle in handles {
                        join_worker(&shared, handle);
                    }
                    return Err(Error::Io(e));
                }
            }
        }

        info!(workers = config.workers, "worker pool started");

        Ok(Self {
            shared,
            workers: Mutex::new(handles),
            worker_count: config.workers,
        })
    }

    /// Queue a closure. Never blocks on other work.
    ///
    /// Accepted while running and while draining; fails with
    /// [`Error::PoolClosed`] once every worker has exited.
    pub fn submit<F>(&self, f: F) -> Result<WorkId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Box::new(move || {
            f();
            Ok(())
        }))
    }

    /// Queue a closure whose `Err` is logged as a work item failure.
    pub fn submit_fallible<F, E>(&self, f: F) -> Result<WorkId>
    where
        F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.enqueue(Box::new(move || f().map_err(Into::into)))
    }

    fn enqueue(&self, job: Job) -> Result<WorkId> {
        let id = WorkId::new();
        // Count first so `executed` can never overtake `submitted`.
        self.shared.submitted.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.shared.queue.push(WorkItem { id, job }) {
            self.shared.submitted.fetch_sub(1, Ordering::Relaxed);
            return Err(e);
        }
        self.shared.instruments.record_submitted();
        debug!(work.id = %id, "work queued");
        Ok(id)
    }

    /// Begin draining and wake every worker. Idempotent, never blocks.
    pub fn shutdown(&self) {
        if self.shared.queue.begin_drain() {
            record_phase_transition(Phase::Running, Phase::Draining);
            info!(pending = self.pending(), "worker pool draining");
        }
    }

    /// Block until every worker has exited.
    ///
    /// Without a prior [`shutdown`](Self::shutdown) this never returns. On a
    /// zero-worker pool the calling thread drains the queue itself.
    pub fn join(&self) {
        let mut handles = self.workers.lock().unwrap_or_else(PoisonError::into_inner);

        if self.worker_count == 0 {
            self.shared.queue.enlist();
            worker::run(&self.shared, "caller");
            return;
        }

        // Already joined, e.g. explicitly before drop.
        if handles.is_empty() {
            return;
        }

        let current = thread::current().id();
        for handle in handles.drain(..) {
            // A worker dropping the last pool handle cannot wait for itself.
            if handle.thread().id() == current {
                continue;
            }
            join_worker(&self.shared, handle);
        }
        info!(executed = self.shared.executed.load(Ordering::Relaxed), "worker pool joined");
    }

    /// Execute everything currently queued on the calling thread.
    /// Returns the number of items run. Does not wait for new work.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Some(item) = self.shared.queue.try_pop() {
            worker::execute(&self.shared, item, "caller");
            ran += 1;
        }
        ran
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn phase(&self) -> Phase {
        self.shared.queue.phase()
    }

    pub fn is_closed(&self) -> bool {
        self.phase() == Phase::Closed
    }

    /// Items queued but not yet picked up.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            submitted: self.shared.submitted.load(Ordering::Relaxed),
            executed: self.shared.executed.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
            pending: self.pending(),
        }
    }
}

/// Wait for one worker thread, reporting a panic that escaped the item boundary.
fn join_worker(shared: &Shared, handle: JoinHandle<()>) {
    let name = handle.thread().name().unwrap_or("worker").to_string();
    if handle.join().is_err() {
        warn!(worker = %name, "worker thread panicked outside an item");
        shared.log.log(&format!("worker {name} terminated abnormally"));
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("worker_count", &self.worker_count)
            .field("phase", &self.phase())
            .field("metrics", &self.metrics())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
        self.join();
    }
}
