//! Diagnostic logging capability.
//!
//! Components that report background failures take an `Arc<dyn Log>` at
//! construction. There is no global logger: the binary builds one instance
//! at startup and hands it to whatever needs it.

mod buffer;

pub use buffer::LineBuffer;

use std::sync::{Mutex, PoisonError};

/// A thread-safe sink for diagnostic lines.
///
/// Implementations must tolerate concurrent calls from worker threads and
/// from the submitting thread without external locking.
pub trait Log: Send + Sync {
    fn log(&self, message: &str);
}

/// Forwards every line to `tracing` at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl Log for TracingLog {
    fn log(&self, message: &str) {
        tracing::info!(target: "workfan::diag", "{message}");
    }
}

/// Keeps every line in memory. Useful in tests and for post-run inspection.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all lines logged so far, in arrival order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of lines containing `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl Log for MemoryLog {
    fn log(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl Log for NullLog {
    fn log(&self, _message: &str) {}
}
