//! Pipeline error types
//!
//! `SinkError` is the delivery taxonomy shared by every sink. `Busy` is not a
//! failure: it hands a record back when the queue cannot take it, and the
//! caller decides whether to fall back to synchronous delivery.

use std::time::Duration;

use beacon_protocol::EventRecord;
use thiserror::Error;

/// Delivery errors reported by sinks
#[derive(Debug, Error)]
pub enum SinkError {
    /// Connection, handshake or transport failure
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its timeout
    #[error("sink call timed out after {0:?}")]
    Timeout(Duration),

    /// Malformed record content
    #[error("cannot encode field '{field}': {reason}")]
    Encoding { field: String, reason: String },

    /// Whole batch aborted, nothing applied
    #[error("batch of {rows} rows rejected: {reason}")]
    BatchRejected { rows: usize, reason: String },

    /// Remote endpoint answered with a non-success status
    #[error("endpoint rejected delivery with status {status}")]
    Rejected { status: u16 },

    /// Some records of a per-record delivery failed
    #[error("{failed} of {total} records failed")]
    Partial { failed: usize, total: usize },

    /// Store-side error not covered above
    #[error("store error: {0}")]
    Store(String),

    /// Sink was closed
    #[error("sink is closed")]
    Closed,
}

impl SinkError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an encoding error
    pub fn encoding(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encoding {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a batch rejected error
    pub fn batch_rejected(rows: usize, reason: impl Into<String>) -> Self {
        Self::BatchRejected {
            rows,
            reason: reason.into(),
        }
    }
}

/// Queue could not admit the record; the record is handed back
#[derive(Debug)]
pub struct Busy(pub EventRecord);

impl Busy {
    /// Take the record back
    #[inline]
    pub fn into_inner(self) -> EventRecord {
        self.0
    }
}

impl std::fmt::Display for Busy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pipeline queue is busy")
    }
}

impl std::error::Error for Busy {}

/// Errors creating a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid pipeline configuration
    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),

    /// No tokio runtime to spawn the worker on
    #[error("pipeline must be started inside a tokio runtime")]
    NoRuntime,
}
