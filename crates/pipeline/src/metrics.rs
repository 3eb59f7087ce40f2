//! Pipeline metrics
//!
//! Atomic counters shared between the producer side and the worker.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one pipeline
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Records admitted to the queue
    records_enqueued: AtomicU64,

    /// Records delivered synchronously because the queue was full or closed
    records_fallback: AtomicU64,

    /// Successful sink deliveries
    batches_delivered: AtomicU64,

    /// Records in successful deliveries
    records_delivered: AtomicU64,

    /// Failed sink deliveries
    delivery_errors: AtomicU64,

    /// Records in failed background deliveries
    records_lost: AtomicU64,

    /// Explicit flush requests served
    flushes: AtomicU64,
}

impl PipelineMetrics {
    /// Create metrics with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            records_enqueued: AtomicU64::new(0),
            records_fallback: AtomicU64::new(0),
            batches_delivered: AtomicU64::new(0),
            records_delivered: AtomicU64::new(0),
            delivery_errors: AtomicU64::new(0),
            records_lost: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_enqueued(&self) {
        self.records_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_fallback(&self) {
        self.records_fallback.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful delivery of `count` records
    #[inline]
    pub fn record_delivered(&self, count: usize) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
        self.records_delivered
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a failed delivery
    ///
    /// `lost` is the number of records the background worker dropped; the
    /// synchronous path passes 0 since its caller sees the error.
    #[inline]
    pub fn record_delivery_error(&self, lost: usize) {
        self.delivery_errors.fetch_add(1, Ordering::Relaxed);
        self.records_lost.fetch_add(lost as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_enqueued: self.records_enqueued.load(Ordering::Relaxed),
            records_fallback: self.records_fallback.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            delivery_errors: self.delivery_errors.load(Ordering::Relaxed),
            records_lost: self.records_lost.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_enqueued: u64,
    pub records_fallback: u64,
    pub batches_delivered: u64,
    pub records_delivered: u64,
    pub delivery_errors: u64,
    pub records_lost: u64,
    pub flushes: u64,
}
