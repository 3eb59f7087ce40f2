//! Beacon Configuration
//!
//! TOML-based configuration for the collector. Every section is optional;
//! an empty file runs the ClickHouse sink with defaults.
//!
//! # Parsing
//!
//! ```
//! use beacon_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sinks.clickhouse]\ndatabase = \"shop\"").unwrap();
//! assert_eq!(config.sinks.enabled(), vec!["clickhouse"]);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//!
//! [server]
//! listen = "0.0.0.0:8091"
//! shutdown_timeout = "10s"
//!
//! [sinks.clickhouse]
//! url = "http://localhost:8123"
//! database = "commerce"
//!
//! [sinks.webhook]
//! endpoint = "https://analytics.example.com"
//! website_id = "..."
//! ```

mod error;
mod logging;
mod server;
mod sinks;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use server::{DEFAULT_LISTEN, DEFAULT_SHUTDOWN_TIMEOUT, ServerConfig};
pub use sinks::{CaptureSinkConfig, ClickHouseSinkConfig, SinksConfig, WebhookSinkConfig};

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// HTTP ingestion server
    pub server: ServerConfig,

    /// Delivery destinations
    pub sinks: SinksConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, parsed, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Call again after applying overrides to a loaded config.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
