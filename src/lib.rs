//! # workfan
//!
//! A fixed-size thread pool draining an unbounded FIFO queue, and a
//! dispatcher that turns one "notify all subscribers" call into one queued
//! work item per subscriber.
//!
//! ```no_run
//! use std::sync::Arc;
//! use workfan::diag::TracingLog;
//! use workfan::pool::WorkerPool;
//! use workfan::signal::AsyncSignal;
//!
//! # fn main() -> workfan::error::Result<()> {
//! let log = Arc::new(TracingLog);
//! let pool = Arc::new(WorkerPool::new(4, log.clone())?);
//!
//! let signal = AsyncSignal::new(Arc::clone(&pool), log);
//! signal.connect(|| println!("slot 1"));
//! signal.connect(|| println!("slot 2"));
//! signal.emit()?; // returns as soon as both are queued
//!
//! pool.shutdown();
//! pool.join(); // both slots have run
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diag;
pub mod error;
pub mod model;
pub mod pool;
pub mod signal;
pub mod telemetry;
