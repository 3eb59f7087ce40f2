//! Protocol error types
//!
//! Errors that can occur when building event records from client input.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Record input is not a JSON object
    #[error("event must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Timestamp field could not be parsed
    #[error("invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: &'static str, value: String },
}

impl ProtocolError {
    /// Create a missing field error
    #[inline]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField(field)
    }

    /// Create an invalid timestamp error
    #[inline]
    pub fn invalid_timestamp(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            field,
            value: value.into(),
        }
    }
}
