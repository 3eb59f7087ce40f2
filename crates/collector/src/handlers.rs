//! HTTP route handlers
//!
//! # Endpoints
//!
//! - `POST /event` - one JSON event
//! - `POST /events` - JSON array, or `{"batch": [...]}`
//! - `GET /health` - health check

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use beacon_pipeline::BatchPipeline;
use beacon_protocol::{EventRecord, Value};
use tracing::{debug, warn};

use crate::response::{BatchResponse, accepted_response, error_response};

/// Shared state for handlers
pub struct AppState {
    pipelines: Vec<Arc<BatchPipeline>>,
}

impl AppState {
    pub fn new(pipelines: Vec<Arc<BatchPipeline>>) -> Self {
        Self { pipelines }
    }

    pub fn pipelines(&self) -> &[Arc<BatchPipeline>] {
        &self.pipelines
    }

    /// Enqueue a copy of the record on every pipeline
    ///
    /// Returns false when no pipeline took it.
    async fn offer(&self, record: EventRecord) -> bool {
        let mut admitted = 0;
        for pipeline in &self.pipelines {
            match pipeline.enqueue(record.clone()).await {
                Ok(admission) => {
                    debug!(sink = %pipeline.name(), ?admission, "record admitted");
                    admitted += 1;
                }
                Err(e) => {
                    warn!(
                        sink = %pipeline.name(),
                        event = record.event(),
                        error = %e,
                        "fallback delivery failed"
                    );
                }
            }
        }
        admitted > 0
    }
}

/// POST /event
pub async fn ingest_event(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_json", e.to_string()),
    };

    let record = match EventRecord::from_json(value) {
        Ok(record) => record,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_event", e.to_string()),
    };

    if state.offer(record).await {
        accepted_response()
    } else {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "service_unavailable",
            "no pipeline accepted the event",
        )
    }
}

/// POST /events
///
/// Responds 202 when every event was accepted, 207 when some were, 503
/// when none were because delivery failed and 400 otherwise.
pub async fn ingest_events(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_json", e.to_string()),
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut wrapper) => match wrapper.remove("batch") {
            Some(Value::Array(items)) => items,
            _ => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "invalid_batch",
                    "expected an array or an object with a 'batch' array",
                );
            }
        },
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_batch",
                "expected an array or an object with a 'batch' array",
            );
        }
    };

    if items.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "empty_batch", "no events in request body");
    }

    let total = items.len();
    let mut result = BatchResponse::default();
    let mut unavailable = 0;

    for item in items {
        match EventRecord::from_json(item) {
            Ok(record) => {
                if state.offer(record).await {
                    result.accepted += 1;
                } else {
                    unavailable += 1;
                    result.rejected += 1;
                }
            }
            Err(e) => {
                debug!(error = %e, "batch element rejected");
                result.rejected += 1;
            }
        }
    }

    let status = if result.accepted == total {
        StatusCode::ACCEPTED
    } else if result.accepted > 0 {
        StatusCode::MULTI_STATUS
    } else if unavailable > 0 {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::BAD_REQUEST
    };

    (status, Json(result)).into_response()
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
