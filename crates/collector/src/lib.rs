//! Beacon Collector
//!
//! Thin HTTP front end: every accepted event is enqueued on one
//! `BatchPipeline` per enabled sink.
//!
//! ```text
//! POST /event ──┬──> [BatchPipeline: clickhouse] --> ClickHouse
//!               ├──> [BatchPipeline: capture]    --> {endpoint}/batch/
//!               └──> [BatchPipeline: webhook]    --> {endpoint}/api/send
//! ```

mod handlers;
mod pipelines;
mod response;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

pub use handlers::AppState;
pub use pipelines::{BuildError, build_pipelines, close_pipelines};
pub use response::{AcceptedResponse, BatchResponse, ErrorResponse};

/// Build the axum router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/event", post(handlers::ingest_event))
        .route("/events", post(handlers::ingest_events))
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
