//! Core data model.
//!
//! Identifiers for queued work and registered subscribers, the pool's
//! lifecycle phase, and the counters a pool exposes to its owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Newtype for work item IDs. Assigned at submission, used only for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkId(pub Uuid);

impl WorkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for WorkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`Registry::connect`](crate::signal::Registry::connect).
///
/// IDs are allocated sequentially per registry, so they also encode
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle phase of a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Accepting and executing work.
    Running,
    /// Shutdown requested. Still accepting work; consumers exit once the queue is empty.
    Draining,
    /// Every consumer has exited. Submission fails. Terminal.
    Closed,
}

impl Phase {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: Phase) -> bool {
        use Phase::*;
        matches!((self, to), (Running, Draining) | (Draining, Closed))
    }

    /// Does this phase still accept submissions?
    pub fn accepts_work(self) -> bool {
        !matches!(self, Phase::Closed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Running => "running",
            Phase::Draining => "draining",
            Phase::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Point-in-time counters for a pool.
///
/// `executed` counts every item that ran, including the ones in `failed`.
/// Once `join()` returns, `executed == submitted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetrics {
    pub submitted: usize,
    pub executed: usize,
    pub failed: usize,
    pub pending: usize,
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Summary of one demo run, printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Which scenario ran ("post" or "signal").
    pub scenario: String,
    pub workers: usize,
    /// Number of items (or subscribers) submitted.
    pub n: usize,
    /// Number observed to execute.
    pub seen: usize,
    pub metrics: PoolMetrics,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Did every submitted item run?
    pub fn is_complete(&self) -> bool {
        self.seen == self.n
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
