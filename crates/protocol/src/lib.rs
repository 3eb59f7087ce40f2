//! Beacon Protocol - Event records flowing through the collector
//!
//! This crate provides the foundational types shared by the pipeline and sinks:
//! - `EventRecord` - An open map of named fields plus two timestamps
//! - `EventKind` - Delivery shape classification (page view, commerce, custom)
//! - `events` - Catalogue of standard event names
//!
//! # Design Principles
//!
//! - **Open schema**: Records keep arbitrary JSON fields; sinks pick what they need
//! - **Owned values**: A record is moved into a pipeline and never mutated afterwards
//! - **Stamped on admission**: Missing timestamps are filled once, by the pipeline

mod error;
pub mod events;
mod kind;
mod record;

pub use error::ProtocolError;
pub use kind::EventKind;
pub use record::{DEFAULT_LIB, EventRecord};

// Re-export the JSON types records are built from
pub use serde_json::{Map, Value};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

// Test modules - only compiled during testing
#[cfg(test)]
mod error_test;
#[cfg(test)]
mod kind_test;
