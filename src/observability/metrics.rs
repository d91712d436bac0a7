//! Update engine metrics
//!
//! - Counters only
//! - Monotonic increase, reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one engine instance
///
/// All counters use Relaxed atomics; readers only need eventually
/// consistent totals.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    applies_started: AtomicU64,
    applies_committed: AtomicU64,
    applies_rejected: AtomicU64,
    operators_executed: AtomicU64,
    validation_failures: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_applies_started(&self) {
        self.applies_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_applies_committed(&self) {
        self.applies_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_applies_rejected(&self) {
        self.applies_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_operators_executed(&self) {
        self.operators_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_validation_failures(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            applies_started: self.applies_started.load(Ordering::Relaxed),
            applies_committed: self.applies_committed.load(Ordering::Relaxed),
            applies_rejected: self.applies_rejected.load(Ordering::Relaxed),
            operators_executed: self.operators_executed.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub applies_started: u64,
    pub applies_committed: u64,
    pub applies_rejected: u64,
    pub operators_executed: u64,
    pub validation_failures: u64,
}
