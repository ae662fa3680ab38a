//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Live counters shared between the handle and the dispatch worker
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Events waiting in the queue (last observed by the worker)
    queue_len: AtomicUsize,
    /// Events accepted into the queue
    enqueued_count: AtomicU64,
    /// Events rejected before reaching the accumulator
    dropped_count: AtomicU64,
    /// Non-empty batches handed to the transport
    flush_count: AtomicU64,
    /// Events in batches the transport accepted
    sent_count: AtomicU64,
    /// Batches the transport failed to deliver
    failure_count: AtomicU64,
    /// Events in failed batches
    lost_count: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn enqueued_count(&self) -> u64 {
        self.enqueued_count.load(Ordering::Relaxed)
    }

    pub fn inc_enqueued_count(&self) {
        self.enqueued_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Relaxed)
    }

    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::Relaxed)
    }

    /// Record a delivered batch
    pub fn record_sent(&self, events: usize) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        self.sent_count.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn lost_count(&self) -> u64 {
        self.lost_count.load(Ordering::Relaxed)
    }

    /// Record a batch that was attempted and discarded
    pub fn record_failure(&self, events: usize) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.lost_count.fetch_add(events as u64, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            enqueued_count: self.enqueued_count(),
            dropped_count: self.dropped_count(),
            flush_count: self.flush_count(),
            sent_count: self.sent_count(),
            failure_count: self.failure_count(),
            lost_count: self.lost_count(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub enqueued_count: u64,
    pub dropped_count: u64,
    pub flush_count: u64,
    pub sent_count: u64,
    pub failure_count: u64,
    pub lost_count: u64,
}
