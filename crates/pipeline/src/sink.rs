//! Sink capability driven by a pipeline
//!
//! Every destination (analytics store, forwarding endpoints) implements
//! `Sink`. The pipeline owns the batching policy; a sink only knows how to
//! deliver one batch.

use std::time::Duration;

use async_trait::async_trait;
use beacon_protocol::EventRecord;

use crate::error::SinkError;

/// Destination for batches of event records
///
/// # Concurrency
///
/// The pipeline worker calls `deliver` one batch at a time, but the overflow
/// fallback path may call it concurrently with the worker. Implementations
/// must tolerate concurrent `deliver` calls.
///
/// # Example
///
/// ```ignore
/// struct PrintSink;
///
/// #[async_trait]
/// impl Sink for PrintSink {
///     fn name(&self) -> &str {
///         "print"
///     }
///
///     async fn deliver(&self, batch: Vec<EventRecord>) -> Result<(), SinkError> {
///         for record in &batch {
///             tracing::info!(event = record.event(), "event");
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Sink: Send + Sync {
    /// Sink name for logs and metrics
    fn name(&self) -> &str;

    /// Deliver one batch
    ///
    /// Called at most once per batch; the pipeline never retries.
    async fn deliver(&self, batch: Vec<EventRecord>) -> Result<(), SinkError>;

    /// Idempotent provisioning check, run once at startup
    ///
    /// Failure is reported but does not prevent the pipeline from running.
    async fn ensure_ready(&self, timeout: Duration) -> Result<(), SinkError> {
        let _ = timeout;
        Ok(())
    }

    /// Release sink-held resources; idempotent
    async fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
