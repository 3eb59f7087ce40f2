//! HTTP ingestion server configuration

use std::time::Duration;

use serde::Deserialize;

/// Default listen address
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8091";

/// Default time allowed for each pipeline to drain on shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Ingestion server configuration
///
/// # Example
///
/// ```toml
/// [server]
/// listen = "0.0.0.0:8091"     # default
/// shutdown_timeout = "10s"    # default
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    /// Default: "0.0.0.0:8091"
    pub listen: String,

    /// Drain deadline per pipeline on shutdown
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}
