//! Tests for protocol error types

use crate::error::ProtocolError;

#[test]
fn test_error_creation_missing_field() {
    let err = ProtocolError::missing_field("event");
    assert!(matches!(err, ProtocolError::MissingField("event")));
}

#[test]
fn test_error_creation_invalid_timestamp() {
    let err = ProtocolError::invalid_timestamp("timestamp", "yesterday");
    assert!(matches!(
        err,
        ProtocolError::InvalidTimestamp {
            field: "timestamp",
            ..
        }
    ));
}

#[test]
fn test_error_display_not_an_object() {
    let err = ProtocolError::NotAnObject("array");
    assert_eq!(err.to_string(), "event must be a JSON object, got array");
}

#[test]
fn test_error_display_invalid_timestamp() {
    let err = ProtocolError::invalid_timestamp("sent_at", "not-a-date");
    assert_eq!(err.to_string(), "invalid timestamp in 'sent_at': not-a-date");
}
