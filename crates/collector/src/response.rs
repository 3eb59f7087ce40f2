//! JSON response bodies

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Body of a rejected request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable code
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Body of a single-event acknowledgement
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
}

/// Body of a batch acknowledgement
#[derive(Debug, Default, Serialize)]
pub struct BatchResponse {
    pub accepted: usize,
    pub rejected: usize,
}

pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(error, message))).into_response()
}

pub fn accepted_response() -> Response {
    (StatusCode::ACCEPTED, Json(AcceptedResponse { status: "accepted" })).into_response()
}
