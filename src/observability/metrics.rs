//! Engine counters
//!
//! - Counters only, monotonic, reset only on process start
//! - Relaxed atomics: exact totals, no ordering with engine state

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one database.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Transactions begun
    transactions_begun: AtomicU64,
    /// Transactions committed
    transactions_committed: AtomicU64,
    /// Transactions aborted, explicitly or by a failed commit
    transactions_aborted: AtomicU64,
    /// Commits rejected by conflict detection
    serialization_failures: AtomicU64,
    /// Successful gets
    gets: AtomicU64,
    /// Gets that found no visible version
    get_misses: AtomicU64,
    /// Successful sets
    sets: AtomicU64,
    /// Successful deletes
    deletes: AtomicU64,
    /// Operations rejected with an error
    rejected: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_begun(&self) {
        self.transactions_begun.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_committed(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_aborted(&self) {
        self.transactions_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// A failed commit also counts as an abort.
    pub fn increment_serialization_failures(&self) {
        self.serialization_failures.fetch_add(1, Ordering::Relaxed);
        self.increment_aborted();
    }

    /// Record a get; `hit` is false when nothing was visible.
    pub fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.get_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_sets(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            transactions_begun: self.transactions_begun.load(Ordering::Relaxed),
            transactions_committed: self.transactions_committed.load(Ordering::Relaxed),
            transactions_aborted: self.transactions_aborted.load(Ordering::Relaxed),
            serialization_failures: self.serialization_failures.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            get_misses: self.get_misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> String {
        // Only integer fields; serialization cannot fail.
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub transactions_begun: u64,
    pub transactions_committed: u64,
    pub transactions_aborted: u64,
    pub serialization_failures: u64,
    pub gets: u64,
    pub get_misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub rejected: u64,
}
