//! Sink configuration
//!
//! One section per destination. Storage is on by default; the forwarders
//! are enabled by adding their section. Any section can set
//! `enabled = false`.
//!
//! ```toml
//! [sinks.clickhouse]
//! url = "http://localhost:8123"
//!
//! [sinks.capture]
//! endpoint = "https://insights.example.com"
//! api_key = "phc_..."
//!
//! [sinks.webhook]
//! endpoint = "https://analytics.example.com"
//! website_id = "..."
//! ```

use std::time::Duration;

use serde::Deserialize;

/// Forwarder queues hold this many batches when `buffer_size` is unset
const FORWARDER_BUFFER_BATCHES: usize = 10;

/// All sink sections
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    pub clickhouse: Option<ClickHouseSinkConfig>,
    pub capture: Option<CaptureSinkConfig>,
    pub webhook: Option<WebhookSinkConfig>,
}

impl Default for SinksConfig {
    fn default() -> Self {
        Self {
            clickhouse: Some(ClickHouseSinkConfig::default()),
            capture: None,
            webhook: None,
        }
    }
}

impl SinksConfig {
    /// Names of the enabled sinks, in construction order
    pub fn enabled(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.clickhouse.as_ref().is_some_and(|c| c.enabled) {
            names.push("clickhouse");
        }
        if self.capture.as_ref().is_some_and(|c| c.enabled) {
            names.push("capture");
        }
        if self.webhook.as_ref().is_some_and(|c| c.enabled) {
            names.push("webhook");
        }
        names
    }
}

/// ClickHouse storage sink
///
/// # Example
///
/// ```toml
/// [sinks.clickhouse]
/// url = "http://localhost:8123"
/// database = "commerce"
/// async_insert = true
/// batch_size = 500
/// flush_interval = "5s"
/// buffer_size = 10000
/// request_timeout = "30s"
/// schema_timeout = "30s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClickHouseSinkConfig {
    /// Default: true
    pub enabled: bool,

    /// HTTP interface URL
    /// Default: "http://localhost:8123"
    pub url: String,

    /// Default: "commerce"
    pub database: String,

    /// Default: "events"
    pub table: String,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Insert each record with server-side async insert instead of one
    /// batched insert per flush
    /// Default: true
    pub async_insert: bool,

    /// Default: 500
    pub batch_size: usize,

    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Pipeline queue capacity
    /// Default: 10000
    pub buffer_size: usize,

    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Deadline for creating the schema at startup
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub schema_timeout: Duration,
}

impl Default for ClickHouseSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:8123".to_string(),
            database: "commerce".to_string(),
            table: "events".to_string(),
            username: None,
            password: None,
            async_insert: true,
            batch_size: 500,
            flush_interval: Duration::from_secs(5),
            buffer_size: 10_000,
            request_timeout: Duration::from_secs(30),
            schema_timeout: Duration::from_secs(30),
        }
    }
}

/// Structured capture forwarder (batch endpoint)
///
/// # Example
///
/// ```toml
/// [sinks.capture]
/// endpoint = "https://insights.example.com"
/// api_key = "phc_..."
/// batch_size = 100
/// flush_interval = "30s"
/// timeout = "10s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSinkConfig {
    /// Default: true
    pub enabled: bool,

    /// Base URL; `/batch/` is appended
    /// Required when enabled
    pub endpoint: String,

    /// Required when enabled
    pub api_key: String,

    /// Default: 100
    pub batch_size: usize,

    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Pipeline queue capacity
    /// Default: 10 batches
    pub buffer_size: Option<usize>,
}

impl Default for CaptureSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::new(),
            api_key: String::new(),
            batch_size: 100,
            flush_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            buffer_size: None,
        }
    }
}

impl CaptureSinkConfig {
    /// Queue capacity, explicit or derived from the batch size
    pub fn capacity(&self) -> usize {
        self.buffer_size
            .unwrap_or(self.batch_size.saturating_mul(FORWARDER_BUFFER_BATCHES))
    }
}

/// Generic webhook forwarder (one call per record)
///
/// # Example
///
/// ```toml
/// [sinks.webhook]
/// endpoint = "https://analytics.example.com"
/// website_id = "..."
/// batch_size = 50
/// flush_interval = "10s"
/// timeout = "5s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookSinkConfig {
    /// Default: true
    pub enabled: bool,

    /// Base URL; `/api/send` is appended
    /// Required when enabled
    pub endpoint: String,

    /// Required when enabled
    pub website_id: String,

    /// Default: 50
    pub batch_size: usize,

    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Pipeline queue capacity
    /// Default: 10 batches
    pub buffer_size: Option<usize>,
}

impl Default for WebhookSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::new(),
            website_id: String::new(),
            batch_size: 50,
            flush_interval: Duration::from_secs(10),
            timeout: Duration::from_secs(5),
            buffer_size: None,
        }
    }
}

impl WebhookSinkConfig {
    /// Queue capacity, explicit or derived from the batch size
    pub fn capacity(&self) -> usize {
        self.buffer_size
            .unwrap_or(self.batch_size.saturating_mul(FORWARDER_BUFFER_BATCHES))
    }
}
