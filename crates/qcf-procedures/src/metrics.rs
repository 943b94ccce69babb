//! Counters for packing and unpacking.
//!
//! The service updates these after every batch; embedders read them with
//! [`ProcedureMetrics::snapshot`] and export them however they like.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe procedure counters.
#[derive(Debug, Default)]
pub struct ProcedureMetrics {
    /// Batches packed successfully (including ones with per-task errors)
    pub batches_packed: AtomicU64,
    /// Batches rejected as a whole
    pub batches_rejected: AtomicU64,
    /// Tasks emitted by packing
    pub tasks_packed: AtomicU64,
    /// Tasks reported as per-task errors
    pub tasks_failed: AtomicU64,
    /// Molecule references that collapsed onto an existing task key
    pub duplicates_collapsed: AtomicU64,
    /// Results restored to the compact shape
    pub results_unpacked: AtomicU64,
    /// Store round trips issued by the service
    pub store_calls: AtomicU64,
}

impl ProcedureMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a packed batch.
    pub fn record_pack(&self, tasks: usize, failed: usize, collapsed: usize) {
        self.batches_packed.fetch_add(1, Ordering::Relaxed);
        self.tasks_packed.fetch_add(tasks as u64, Ordering::Relaxed);
        self.tasks_failed.fetch_add(failed as u64, Ordering::Relaxed);
        self.duplicates_collapsed
            .fetch_add(collapsed as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unpack(&self, results: usize) {
        self.results_unpacked
            .fetch_add(results as u64, Ordering::Relaxed);
    }

    pub fn record_store_call(&self) {
        self.store_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_packed: self.batches_packed.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            tasks_packed: self.tasks_packed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            duplicates_collapsed: self.duplicates_collapsed.load(Ordering::Relaxed),
            results_unpacked: self.results_unpacked.load(Ordering::Relaxed),
            store_calls: self.store_calls.load(Ordering::Relaxed),
        }
    }

    /// Fraction of requested tasks that failed to pack.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.tasks_failed.load(Ordering::Relaxed);
        let total = failed + self.tasks_packed.load(Ordering::Relaxed);
        if total > 0 {
            failed as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.batches_packed.store(0, Ordering::Relaxed);
        self.batches_rejected.store(0, Ordering::Relaxed);
        self.tasks_packed.store(0, Ordering::Relaxed);
        self.tasks_failed.store(0, Ordering::Relaxed);
        self.duplicates_collapsed.store(0, Ordering::Relaxed);
        self.results_unpacked.store(0, Ordering::Relaxed);
        self.store_calls.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_packed: u64,
    pub batches_rejected: u64,
    pub tasks_packed: u64,
    pub tasks_failed: u64,
    pub duplicates_collapsed: u64,
    pub results_unpacked: u64,
    pub store_calls: u64,
}
