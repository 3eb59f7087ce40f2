//! Beacon - Pipeline
//!
//! Bounded batch delivery from producers to one sink.
//!
//! # Architecture
//!
//! ```text
//! HTTP handlers ──enqueue──→ BatchPipeline ──→ mpsc (bounded) ──→ Worker ──deliver──→ Sink
//!                                 │                                  ↑
//!                                 │                        size / interval / flush
//!                                 └── queue full or closed: deliver([record]) inline
//! ```
//!
//! # Key Design
//!
//! - **Non-blocking admission**: `try_send` under a short lock, never waits on sink I/O
//! - **Two triggers**: a batch is delivered when it reaches `batch_size` or
//!   when `flush_interval` elapses, whichever comes first
//! - **Overflow fallback**: a saturated or closed queue degrades to one
//!   synchronous single-record delivery instead of dropping
//! - **Graceful drain**: `close()` delivers the remainder and joins the worker
//!
//! # Example
//!
//! ```ignore
//! use beacon_pipeline::{BatchPipeline, PipelineConfig};
//!
//! let pipeline = BatchPipeline::spawn("clickhouse", PipelineConfig::default(), sink)?;
//! pipeline.enqueue(record).await?;
//! pipeline.close().await?;
//! ```

mod batch_pipeline;
mod config;
mod error;
mod logger;
mod metrics;
mod sink;

pub use batch_pipeline::{Admission, BatchPipeline};
pub use config::{DEFAULT_BATCH_SIZE, DEFAULT_CAPACITY, DEFAULT_FLUSH_INTERVAL, PipelineConfig};
pub use error::{Busy, PipelineError, SinkError};
pub use logger::{DEFAULT_LOG_INTERVAL, RateLimitedLogger};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use sink::Sink;

pub use beacon_protocol::EventRecord;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

#[cfg(test)]
#[path = "batch_pipeline_test.rs"]
mod batch_pipeline_test;
