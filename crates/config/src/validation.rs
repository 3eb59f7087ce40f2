//! Configuration validation
//!
//! Validates config consistency:
//! - At least one sink is enabled
//! - Required fields are present for enabled sinks
//! - Batch and queue sizes are positive, intervals non-zero
//! - The ClickHouse database and table are plain identifiers

use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_sinks(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    if config.server.listen.is_empty() {
        return Err(ConfigError::missing_field("server", "listen"));
    }
    Ok(())
}

/// Validate sink configurations
fn validate_sinks(config: &Config) -> Result<()> {
    let sinks = &config.sinks;
    if sinks.enabled().is_empty() {
        return Err(ConfigError::NoSinksEnabled);
    }

    if let Some(ch) = sinks.clickhouse.as_ref().filter(|c| c.enabled) {
        if ch.url.is_empty() {
            return Err(ConfigError::missing_field("sinks.clickhouse", "url"));
        }
        validate_identifier("sinks.clickhouse", "database", &ch.database)?;
        validate_identifier("sinks.clickhouse", "table", &ch.table)?;
        validate_batching("sinks.clickhouse", ch.batch_size, ch.buffer_size, ch.flush_interval)?;
        validate_timeout("sinks.clickhouse", "request_timeout", ch.request_timeout)?;
    }

    if let Some(capture) = sinks.capture.as_ref().filter(|c| c.enabled) {
        if capture.endpoint.is_empty() {
            return Err(ConfigError::missing_field("sinks.capture", "endpoint"));
        }
        if capture.api_key.is_empty() {
            return Err(ConfigError::missing_field("sinks.capture", "api_key"));
        }
        validate_batching(
            "sinks.capture",
            capture.batch_size,
            capture.capacity(),
            capture.flush_interval,
        )?;
        validate_timeout("sinks.capture", "timeout", capture.timeout)?;
    }

    if let Some(webhook) = sinks.webhook.as_ref().filter(|c| c.enabled) {
        if webhook.endpoint.is_empty() {
            return Err(ConfigError::missing_field("sinks.webhook", "endpoint"));
        }
        if webhook.website_id.is_empty() {
            return Err(ConfigError::missing_field("sinks.webhook", "website_id"));
        }
        validate_batching(
            "sinks.webhook",
            webhook.batch_size,
            webhook.capacity(),
            webhook.flush_interval,
        )?;
        validate_timeout("sinks.webhook", "timeout", webhook.timeout)?;
    }

    Ok(())
}

fn validate_batching(
    section: &'static str,
    batch_size: usize,
    buffer_size: usize,
    flush_interval: Duration,
) -> Result<()> {
    if batch_size == 0 {
        return Err(ConfigError::invalid_value(section, "batch_size", "must be > 0"));
    }
    if buffer_size == 0 {
        return Err(ConfigError::invalid_value(section, "buffer_size", "must be > 0"));
    }
    if flush_interval.is_zero() {
        return Err(ConfigError::invalid_value(section, "flush_interval", "must be > 0"));
    }
    Ok(())
}

fn validate_timeout(section: &'static str, field: &'static str, timeout: Duration) -> Result<()> {
    if timeout.is_zero() {
        return Err(ConfigError::invalid_value(section, field, "must be > 0"));
    }
    Ok(())
}

/// Database and table names are interpolated into DDL
fn validate_identifier(section: &'static str, field: &'static str, value: &str) -> Result<()> {
    let mut chars = value.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            section,
            field,
            "must start with a letter or '_' and contain only letters, digits and '_'",
        ))
    }
}
