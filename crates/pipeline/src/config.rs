//! Pipeline configuration

use std::time::Duration;

use crate::error::PipelineError;

/// Default queue capacity
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Default batch size
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default flush interval
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Batching policy for one pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Queue capacity, records waiting for the worker
    pub capacity: usize,

    /// Records per batch (size trigger)
    pub batch_size: usize,

    /// Maximum time a partial batch waits (time trigger)
    pub flush_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl PipelineConfig {
    /// Create a config with explicit values
    pub const fn new(capacity: usize, batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            capacity,
            batch_size,
            flush_interval,
        }
    }

    /// Set the queue capacity
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the batch size
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the flush interval
    #[must_use]
    pub const fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    /// Validate the config
    ///
    /// # Errors
    ///
    /// Returns error if any value is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.capacity == 0 {
            return Err(PipelineError::InvalidConfig("capacity must be > 0".into()));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidConfig("batch_size must be > 0".into()));
        }
        if self.flush_interval.is_zero() {
            return Err(PipelineError::InvalidConfig("flush_interval must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.capacity, 10_000);
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.flush_interval, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = PipelineConfig::default()
            .with_capacity(20)
            .with_batch_size(5)
            .with_flush_interval(Duration::from_millis(250));
        assert_eq!(config, PipelineConfig::new(20, 5, Duration::from_millis(250)));
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(PipelineConfig::default().with_capacity(0).validate().is_err());
        assert!(PipelineConfig::default().with_batch_size(0).validate().is_err());
        assert!(
            PipelineConfig::default()
                .with_flush_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
