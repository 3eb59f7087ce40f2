//! Generic forwarder: one call per record to `{endpoint}/api/send`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beacon_pipeline::{Sink, SinkError};
use beacon_protocol::EventRecord;

use crate::common::{MetricsSnapshot, SinkMetrics};

use super::payload::WebhookEnvelope;
use super::{build_http_client, endpoint_url, post_json};

/// Default request timeout
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

const SEND_PATH: &str = "/api/send";

/// Configuration for the webhook forwarder
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Base URL of the analytics service
    pub endpoint: String,

    /// Website id stamped on every payload
    pub website_id: String,

    /// Request timeout
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn new(endpoint: impl Into<String>, website_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            website_id: website_id.into(),
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
        }
    }

    /// Set request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Forwards each record as a provider payload
pub struct WebhookSink {
    name: String,
    config: WebhookConfig,
    url: String,
    client: reqwest::Client,
    closed: AtomicBool,
    metrics: Arc<SinkMetrics>,
}

impl WebhookSink {
    /// Create a new webhook sink
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client can't be built.
    pub fn new(config: WebhookConfig) -> Result<Self, SinkError> {
        Self::with_name(config, "webhook")
    }

    /// Create a new webhook sink with a custom name
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client can't be built.
    pub fn with_name(config: WebhookConfig, name: impl Into<String>) -> Result<Self, SinkError> {
        Ok(Self {
            name: name.into(),
            url: endpoint_url(&config.endpoint, SEND_PATH),
            client: build_http_client(config.timeout)?,
            config,
            closed: AtomicBool::new(false),
            metrics: Arc::new(SinkMetrics::new()),
        })
    }

    /// Full send URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl Sink for WebhookSink {
    fn name(&self) -> &str {
        &self.name
    }

    /// Every record is attempted even after a failure
    async fn deliver(&self, batch: Vec<EventRecord>) -> Result<(), SinkError> {
        let total = batch.len();
        let mut failed = 0;
        let mut last_error = None;

        for record in &batch {
            let body = WebhookEnvelope::from_record(record, &self.config.website_id);
            match post_json(&self.client, &self.url, &body, self.config.timeout).await {
                Ok(()) => self.metrics.request_ok(1),
                Err(e) => {
                    self.metrics.request_failed();
                    tracing::debug!(sink = %self.name, event = record.event(), error = %e, "forward failed");
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            None => Ok(()),
            Some(e) if total == 1 => Err(e),
            Some(_) => Err(SinkError::Partial { failed, total }),
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
            "webhook forwarder closed"
        );
        Ok(())
    }
}
