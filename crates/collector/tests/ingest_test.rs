//! Ingestion endpoint tests
//!
//! Requests go through the real router into real pipelines backed by
//! in-memory sinks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use beacon_collector::{AppState, close_pipelines, router};
use beacon_pipeline::{BatchPipeline, PipelineConfig, Sink, SinkError};
use beacon_protocol::EventRecord;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tower::ServiceExt;

// =============================================================================
// Test sink
// =============================================================================

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<EventRecord>>,
    fail: AtomicBool,
}

impl RecordingSink {
    fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    fn events(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.event().to_string()).collect()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, batch: Vec<EventRecord>) -> Result<(), SinkError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::unavailable("down"));
        }
        self.records.lock().extend(batch);
        Ok(())
    }
}

fn pipeline(sink: &Arc<RecordingSink>) -> Arc<BatchPipeline> {
    let config = PipelineConfig::new(100, 50, Duration::from_secs(60));
    let sink: Arc<dyn Sink> = Arc::clone(sink) as Arc<dyn Sink>;
    Arc::new(BatchPipeline::spawn("recording", config, sink).unwrap())
}

fn app(pipelines: &[Arc<BatchPipeline>]) -> Router {
    router(Arc::new(AppState::new(pipelines.to_vec())))
}

async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(app(&[]), "GET", "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

// =============================================================================
// POST /event
// =============================================================================

#[tokio::test]
async fn test_single_event_accepted_and_delivered() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = pipeline(&sink);

    let body = r#"{"event":"signed_up","distinct_id":"user-1","properties":{"plan":"pro"}}"#;
    let (status, json) = send(app(&[pipeline.clone()]), "POST", "/event", body).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json, json!({"status": "accepted"}));

    pipeline.flush().await.unwrap();
    assert_eq!(sink.events(), vec!["signed_up"]);

    let record = sink.records.lock()[0].clone();
    assert_eq!(record.distinct_id(), "user-1");
    assert!(record.occurred_at().is_some());
    assert!(record.sent_at().is_some());
}

#[tokio::test]
async fn test_event_fans_out_to_every_pipeline() {
    let first = Arc::new(RecordingSink::default());
    let second = Arc::new(RecordingSink::default());
    let pipelines = [pipeline(&first), pipeline(&second)];

    let (status, _) = send(app(&pipelines), "POST", "/event", r#"{"event":"$pageview"}"#).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    close_pipelines(&pipelines, Duration::from_secs(5)).await;
    assert_eq!(first.events(), vec!["$pageview"]);
    assert_eq!(second.events(), vec!["$pageview"]);
}

#[tokio::test]
async fn test_invalid_json_rejected() {
    let (status, json) = send(app(&[]), "POST", "/event", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_json");
}

#[tokio::test]
async fn test_non_object_rejected() {
    let (status, json) = send(app(&[]), "POST", "/event", "[1, 2]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_event");
}

#[tokio::test]
async fn test_missing_event_name_rejected() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = pipeline(&sink);

    let (status, json) = send(app(&[pipeline.clone()]), "POST", "/event", r#"{"distinct_id":"u"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("event"));

    pipeline.close().await.unwrap();
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_unavailable_when_every_pipeline_fails() {
    let sink = Arc::new(RecordingSink::failing());
    let pipeline = pipeline(&sink);
    pipeline.close().await.unwrap();

    let (status, json) = send(app(&[pipeline]), "POST", "/event", r#"{"event":"x"}"#).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "service_unavailable");
}

#[tokio::test]
async fn test_accepted_when_one_pipeline_takes_it() {
    let broken = Arc::new(RecordingSink::failing());
    let broken_pipeline = pipeline(&broken);
    broken_pipeline.close().await.unwrap();

    let healthy = Arc::new(RecordingSink::default());
    let healthy_pipeline = pipeline(&healthy);

    let pipelines = [broken_pipeline, healthy_pipeline.clone()];
    let (status, _) = send(app(&pipelines), "POST", "/event", r#"{"event":"x"}"#).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    healthy_pipeline.flush().await.unwrap();
    assert_eq!(healthy.events(), vec!["x"]);
}

#[tokio::test]
async fn test_closed_pipeline_still_delivers_through_fallback() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = pipeline(&sink);
    pipeline.close().await.unwrap();

    let (status, _) = send(app(&[pipeline]), "POST", "/event", r#"{"event":"late"}"#).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(sink.events(), vec!["late"]);
}

// =============================================================================
// POST /events
// =============================================================================

#[tokio::test]
async fn test_batch_array_accepted() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = pipeline(&sink);

    let body = r#"[{"event":"a"},{"event":"b"},{"event":"c"}]"#;
    let (status, json) = send(app(&[pipeline.clone()]), "POST", "/events", body).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json, json!({"accepted": 3, "rejected": 0}));

    pipeline.flush().await.unwrap();
    assert_eq!(sink.events(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_batch_wrapper_object_accepted() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = pipeline(&sink);

    let body = r#"{"batch":[{"event":"a"},{"event":"b"}]}"#;
    let (status, json) = send(app(&[pipeline]), "POST", "/events", body).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["accepted"], 2);
}

#[tokio::test]
async fn test_batch_with_invalid_elements_is_multi_status() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = pipeline(&sink);

    let body = r#"[{"event":"a"},{"distinct_id":"no-name"},"text",{"event":"b"}]"#;
    let (status, json) = send(app(&[pipeline.clone()]), "POST", "/events", body).await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(json, json!({"accepted": 2, "rejected": 2}));

    pipeline.flush().await.unwrap();
    assert_eq!(sink.events(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_batch_all_invalid_is_bad_request() {
    let (status, json) = send(app(&[]), "POST", "/events", r#"[{"x":1},{"y":2}]"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"accepted": 0, "rejected": 2}));
}

#[tokio::test]
async fn test_batch_all_unavailable() {
    let sink = Arc::new(RecordingSink::failing());
    let pipeline = pipeline(&sink);
    pipeline.close().await.unwrap();

    let (status, json) = send(app(&[pipeline]), "POST", "/events", r#"[{"event":"a"}]"#).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json, json!({"accepted": 0, "rejected": 1}));
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let (status, json) = send(app(&[]), "POST", "/events", "[]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "empty_batch");
}

#[tokio::test]
async fn test_batch_wrong_shape_rejected() {
    let (status, json) = send(app(&[]), "POST", "/events", r#"{"events":[]}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_batch");
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn test_close_pipelines_drains_queued_records() {
    let sink = Arc::new(RecordingSink::default());
    let pipelines = [pipeline(&sink)];

    for name in ["a", "b"] {
        let body = format!(r#"{{"event":"{name}"}}"#);
        let (status, _) = send(app(&pipelines), "POST", "/event", &body).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }
    assert!(sink.events().is_empty());

    close_pipelines(&pipelines, Duration::from_secs(5)).await;
    assert_eq!(sink.events(), vec!["a", "b"]);
    assert!(pipelines[0].is_closed());
    assert_eq!(pipelines[0].metrics().records_delivered, 2);
}

/// Sink whose deliveries never complete
#[derive(Default)]
struct StalledSink {
    closed: AtomicBool,
}

#[async_trait]
impl Sink for StalledSink {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn deliver(&self, _batch: Vec<EventRecord>) -> Result<(), SinkError> {
        std::future::pending().await
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_close_pipelines_abandons_stalled_drain() {
    let stalled = Arc::new(StalledSink::default());
    let config = PipelineConfig::new(100, 50, Duration::from_secs(60));
    let stalled_pipeline = Arc::new(
        BatchPipeline::spawn("stalled", config, Arc::clone(&stalled) as Arc<dyn Sink>).unwrap(),
    );
    let recording = Arc::new(RecordingSink::default());
    let pipelines = [stalled_pipeline, pipeline(&recording)];

    let (status, _) = send(app(&pipelines), "POST", "/event", r#"{"event":"late"}"#).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    tokio::time::timeout(
        Duration::from_secs(5),
        close_pipelines(&pipelines, Duration::from_millis(100)),
    )
    .await
    .expect("close_pipelines should give up on the stalled pipeline");

    assert!(!stalled.closed.load(Ordering::SeqCst));
    assert!(pipelines[0].is_closed());
    assert_eq!(recording.events(), vec!["late"]);
}
