//! Metric instrument factories for workfan.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`
//! (a no-op until `init_telemetry` installs one). All instruments come from
//! the `"workfan"` meter.

use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for workfan instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("workfan")
}

/// Counter: work items accepted by a pool.
/// Labels: `pool`.
pub fn work_submitted() -> Counter<u64> {
    meter()
        .u64_counter("workfan.work.submitted")
        .with_description("Number of work items accepted")
        .build()
}

/// Counter: work items that ran, successfully or not.
/// Labels: `pool`.
pub fn work_executed() -> Counter<u64> {
    meter()
        .u64_counter("workfan.work.executed")
        .with_description("Number of work items executed")
        .build()
}

/// Counter: work items that panicked or returned an error.
/// Labels: `pool`.
pub fn work_failed() -> Counter<u64> {
    meter()
        .u64_counter("workfan.work.failed")
        .with_description("Number of work items that failed")
        .build()
}

/// Histogram: work item execution time in milliseconds.
/// Labels: `pool`, `outcome` ("ok" | "failed").
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("workfan.operation.duration_ms")
        .with_description("Work item execution duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// The instruments one pool records into, built once at pool construction.
pub struct PoolInstruments {
    submitted: Counter<u64>,
    executed: Counter<u64>,
    failed: Counter<u64>,
    duration_ms: Histogram<f64>,
    pool: KeyValue,
}

impl PoolInstruments {
    /// `pool` labels every measurement (the pool's thread name prefix).
    pub fn new(pool: &str) -> Self {
        Self {
            submitted: work_submitted(),
            executed: work_executed(),
            failed: work_failed(),
            duration_ms: operation_duration_ms(),
            pool: KeyValue::new("pool", pool.to_string()),
        }
    }

    pub fn record_submitted(&self) {
        self.submitted.add(1, std::slice::from_ref(&self.pool));
    }

    pub fn record_executed(&self, elapsed: Duration, failed: bool) {
        let labels = std::slice::from_ref(&self.pool);
        self.executed.add(1, labels);
        if failed {
            self.failed.add(1, labels);
        }
        let outcome = KeyValue::new("outcome", if failed { "failed" } else { "ok" });
        self.duration_ms.record(
            elapsed.as_secs_f64() * 1000.0,
            &[self.pool.clone(), outcome],
        );
    }
}
