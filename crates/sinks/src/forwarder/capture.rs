//! Structured forwarder: one JSON array per batch to `{endpoint}/batch/`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beacon_pipeline::{Sink, SinkError};
use beacon_protocol::EventRecord;
use chrono::Utc;

use crate::common::{MetricsSnapshot, SinkMetrics};

use super::payload::CaptureEvent;
use super::{build_http_client, endpoint_url, post_json};

/// Default request timeout
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

/// Batch ingestion path
const BATCH_PATH: &str = "/batch/";

/// Configuration for the capture forwarder
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Base URL of the ingestion service
    pub endpoint: String,

    /// Project API key sent with every event
    pub api_key: String,

    /// Request timeout
    pub timeout: Duration,
}

impl CaptureConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }

    /// Set request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Forwards whole batches to a capture-style batch endpoint
pub struct CaptureSink {
    name: String,
    config: CaptureConfig,
    url: String,
    client: reqwest::Client,
    closed: AtomicBool,
    metrics: Arc<SinkMetrics>,
}

impl CaptureSink {
    /// Create a new capture sink
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client can't be built.
    pub fn new(config: CaptureConfig) -> Result<Self, SinkError> {
        Self::with_name(config, "capture")
    }

    /// Create a new capture sink with a custom name
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client can't be built.
    pub fn with_name(config: CaptureConfig, name: impl Into<String>) -> Result<Self, SinkError> {
        Ok(Self {
            name: name.into(),
            url: endpoint_url(&config.endpoint, BATCH_PATH),
            client: build_http_client(config.timeout)?,
            config,
            closed: AtomicBool::new(false),
            metrics: Arc::new(SinkMetrics::new()),
        })
    }

    /// Full batch URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl Sink for CaptureSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, batch: Vec<EventRecord>) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let events: Vec<CaptureEvent<'_>> = batch
            .iter()
            .map(|record| CaptureEvent::from_record(record, &self.config.api_key, now))
            .collect();

        match post_json(&self.client, &self.url, &events, self.config.timeout).await {
            Ok(()) => {
                self.metrics.request_ok(events.len());
                tracing::debug!(sink = %self.name, count = events.len(), "batch forwarded");
                Ok(())
            }
            Err(e) => {
                self.metrics.request_failed();
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<(), SinkError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            requests_sent = snapshot.requests_sent,
            records_written = snapshot.records_written,
            request_errors = snapshot.request_errors,
            "capture forwarder closed"
        );
        Ok(())
    }
}
