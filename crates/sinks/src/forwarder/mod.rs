//! Forwarder Sinks - HTTP forwarding to third-party analytics
//!
//! Two shapes of endpoint are supported:
//!
//! | Sink | Endpoint | Requests |
//! |------|----------|----------|
//! | `CaptureSink` | `{endpoint}/batch/` | one JSON array per batch |
//! | `WebhookSink` | `{endpoint}/api/send` | one JSON object per record |
//!
//! Both share a `reqwest` client with a request timeout. Any non-2xx status is
//! `SinkError::Rejected`, a client timeout is `SinkError::Timeout` and any
//! other transport failure is `SinkError::Unavailable`. Nothing is retried.
//!
//! # Example
//!
//! ```ignore
//! let sink = CaptureSink::new(CaptureConfig::new("https://insights.example.com", "phc_key"))?;
//! let pipeline = BatchPipeline::spawn("capture", pipeline_config, Arc::new(sink))?;
//! ```

mod capture;
mod payload;
mod webhook;

use std::time::Duration;

use beacon_pipeline::SinkError;
use serde::Serialize;

pub use capture::{CaptureConfig, CaptureSink, DEFAULT_CAPTURE_TIMEOUT};
pub use payload::{CaptureEvent, WebhookEnvelope, WebhookPayload};
pub use webhook::{DEFAULT_WEBHOOK_TIMEOUT, WebhookConfig, WebhookSink};

/// Build an HTTP client with a total request timeout
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, SinkError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SinkError::unavailable(format!("failed to build http client: {e}")))
}

/// Join an endpoint base URL and a path
pub(crate) fn endpoint_url(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), path)
}

/// POST a JSON body and require a 2xx answer
pub(crate) async fn post_json<T>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
    timeout: Duration,
) -> Result<(), SinkError>
where
    T: Serialize + ?Sized,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| transport_error(&e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SinkError::Rejected {
            status: status.as_u16(),
        });
    }
    Ok(())
}

fn transport_error(e: &reqwest::Error, timeout: Duration) -> SinkError {
    if e.is_timeout() {
        SinkError::Timeout(timeout)
    } else {
        SinkError::unavailable(e.to_string())
    }
}
