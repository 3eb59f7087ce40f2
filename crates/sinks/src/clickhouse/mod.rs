//! ClickHouse Sink - Analytics Store
//!
//! Persists event records into the wide `events` table of the analytics
//! database.
//!
//! # Delivery modes
//!
//! | Mode | Requests | Encoding error |
//! |------|----------|----------------|
//! | batched (`async_insert = false`) | one multi-row insert per batch | whole batch rejected, nothing sent |
//! | async (`async_insert = true`) | one insert per record, server buffers | only that record fails |
//!
//! # Tables
//!
//! | Table | Purpose |
//! |-------|---------|
//! | events | one row per event |
//! | events_hourly | hourly rollup (SummingMergeTree) |
//! | events_hourly_mv | materialized view feeding the rollup |
//! | persons | person properties (ReplacingMergeTree) |
//! | sessions | session summaries (ReplacingMergeTree) |
//! | groups | group properties (ReplacingMergeTree) |
//!
//! `ensure_ready` creates the database and every table.

mod config;
mod schema;
mod sink;
pub mod tables;

pub use config::{
    ClickHouseConfig, DEFAULT_DATABASE, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TABLE, DEFAULT_URL,
};
pub use schema::schema_statements;
pub use sink::ClickHouseSink;
pub use tables::EventRow;
