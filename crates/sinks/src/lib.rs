//! Beacon - Sinks
//!
//! Destinations for batches of event records. Each sink implements
//! `beacon_pipeline::Sink` and is driven by a `BatchPipeline`, which owns the
//! batching policy.
//!
//! ```text
//! [BatchPipeline] --Vec<EventRecord>--> [Sink::deliver] --> [Destination]
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Destination | Calls per batch |
//! |------|-------------|-----------------|
//! | `clickhouse` | ClickHouse `events` table | 1 (batched) or 1 per record (async insert) |
//! | `forwarder::CaptureSink` | `{endpoint}/batch/` | 1 |
//! | `forwarder::WebhookSink` | `{endpoint}/api/send` | 1 per record |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use beacon_pipeline::{BatchPipeline, PipelineConfig};
//! use beacon_sinks::clickhouse::{ClickHouseConfig, ClickHouseSink};
//!
//! let sink = Arc::new(ClickHouseSink::new(ClickHouseConfig::default()));
//! let pipeline = BatchPipeline::spawn("clickhouse", PipelineConfig::default(), sink)?;
//! ```

// =============================================================================
// Sink implementations
// =============================================================================

/// ClickHouse sink - analytics store
pub mod clickhouse;

/// Forwarder sinks - third-party HTTP endpoints
pub mod forwarder;

/// Request counters shared by all sinks
mod common;

// =============================================================================
// Public re-exports
// =============================================================================

pub use common::{MetricsSnapshot, SinkMetrics};

pub use self::clickhouse::{ClickHouseConfig, ClickHouseSink};
pub use forwarder::{CaptureConfig, CaptureSink, WebhookConfig, WebhookSink};

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
