//! Pipeline construction from configuration

use std::sync::Arc;
use std::time::Duration;

use beacon_config::{CaptureSinkConfig, ClickHouseSinkConfig, SinksConfig, WebhookSinkConfig};
use beacon_pipeline::{BatchPipeline, PipelineConfig, PipelineError, Sink, SinkError};
use beacon_sinks::{
    CaptureConfig, CaptureSink, ClickHouseConfig, ClickHouseSink, WebhookConfig, WebhookSink,
};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

/// Errors while wiring sinks to pipelines
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to create sink '{sink}': {source}")]
    Sink {
        sink: &'static str,
        #[source]
        source: SinkError,
    },

    #[error("failed to start pipeline '{sink}': {source}")]
    Pipeline {
        sink: &'static str,
        #[source]
        source: PipelineError,
    },
}

/// Start one pipeline per enabled sink
///
/// The ClickHouse schema is created first. Failure there is logged and
/// startup continues; deliveries fail until the store is reachable.
///
/// # Errors
///
/// Returns error if a sink client or pipeline can't be created.
pub async fn build_pipelines(config: &SinksConfig) -> Result<Vec<Arc<BatchPipeline>>, BuildError> {
    let mut pipelines = Vec::new();

    if let Some(ch) = config.clickhouse.as_ref().filter(|c| c.enabled) {
        let sink = Arc::new(ClickHouseSink::with_name(clickhouse_config(ch), "clickhouse"));
        if let Err(e) = sink.ensure_ready(ch.schema_timeout).await {
            warn!(sink = "clickhouse", error = %e, "schema setup failed, continuing");
        }
        let pipeline_config = PipelineConfig::new(ch.buffer_size, ch.batch_size, ch.flush_interval);
        pipelines.push(spawn("clickhouse", pipeline_config, sink)?);
    }

    if let Some(capture) = config.capture.as_ref().filter(|c| c.enabled) {
        let sink = CaptureSink::with_name(capture_config(capture), "capture")
            .map_err(|source| BuildError::Sink { sink: "capture", source })?;
        let pipeline_config =
            PipelineConfig::new(capture.capacity(), capture.batch_size, capture.flush_interval);
        pipelines.push(spawn("capture", pipeline_config, Arc::new(sink))?);
    }

    if let Some(webhook) = config.webhook.as_ref().filter(|c| c.enabled) {
        let sink = WebhookSink::with_name(webhook_config(webhook), "webhook")
            .map_err(|source| BuildError::Sink { sink: "webhook", source })?;
        let pipeline_config =
            PipelineConfig::new(webhook.capacity(), webhook.batch_size, webhook.flush_interval);
        pipelines.push(spawn("webhook", pipeline_config, Arc::new(sink))?);
    }

    Ok(pipelines)
}

fn spawn(
    name: &'static str,
    config: PipelineConfig,
    sink: Arc<dyn Sink>,
) -> Result<Arc<BatchPipeline>, BuildError> {
    BatchPipeline::spawn(name, config, sink)
        .map(Arc::new)
        .map_err(|source| BuildError::Pipeline { sink: name, source })
}

fn clickhouse_config(ch: &ClickHouseSinkConfig) -> ClickHouseConfig {
    let mut config = ClickHouseConfig::default()
        .with_url(&ch.url)
        .with_database(&ch.database)
        .with_table(&ch.table)
        .with_async_insert(ch.async_insert)
        .with_request_timeout(ch.request_timeout);
    config.username = ch.username.clone();
    config.password = ch.password.clone();
    config
}

fn capture_config(capture: &CaptureSinkConfig) -> CaptureConfig {
    CaptureConfig::new(&capture.endpoint, &capture.api_key).with_timeout(capture.timeout)
}

fn webhook_config(webhook: &WebhookSinkConfig) -> WebhookConfig {
    WebhookConfig::new(&webhook.endpoint, &webhook.website_id).with_timeout(webhook.timeout)
}

/// Close every pipeline, giving each `deadline` to drain
pub async fn close_pipelines(pipelines: &[Arc<BatchPipeline>], deadline: Duration) {
    for pipeline in pipelines {
        match timeout(deadline, pipeline.close()).await {
            Ok(Ok(())) => {
                let metrics = pipeline.metrics();
                info!(
                    sink = %pipeline.name(),
                    records_delivered = metrics.records_delivered,
                    records_lost = metrics.records_lost,
                    "pipeline drained"
                );
            }
            Ok(Err(e)) => warn!(sink = %pipeline.name(), error = %e, "pipeline closed with error"),
            Err(_) => warn!(
                sink = %pipeline.name(),
                timeout = ?deadline,
                "pipeline drain abandoned after timeout, sink left unclosed"
            ),
        }
    }
}
