//! Common types shared by all sinks

use std::sync::atomic::{AtomicU64, Ordering};

/// Request-level counters kept by every sink
///
/// The pipeline counts batches; these count what actually went over the
/// wire, which differs for per-record sinks.
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Requests sent (inserts or HTTP calls)
    pub requests_sent: AtomicU64,

    /// Records accepted by the destination
    pub records_written: AtomicU64,

    /// Requests that failed
    pub request_errors: AtomicU64,

    /// Records rejected before sending (encoding)
    pub records_rejected: AtomicU64,
}

impl SinkMetrics {
    pub const fn new() -> Self {
        Self {
            requests_sent: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            request_errors: AtomicU64::new(0),
            records_rejected: AtomicU64::new(0),
        }
    }

    /// Record a successful request carrying `records` records
    #[inline]
    pub fn request_ok(&self, records: usize) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        self.records_written
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    /// Record a failed request
    #[inline]
    pub fn request_failed(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        self.request_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record records dropped before any request was made
    #[inline]
    pub fn rejected(&self, records: usize) {
        self.records_rejected
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            request_errors: self.request_errors.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub records_written: u64,
    pub request_errors: u64,
    pub records_rejected: u64,
}
