//! Consumer configuration types.

use std::time::Duration;

use serde::Deserialize;

/// Consumer lane and persistence settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Number of identifier-affinity lanes processed concurrently.
    pub lanes: usize,
    /// Queued messages per lane before intake waits.
    pub lane_capacity: usize,
    /// Upper bound on a single store write, in milliseconds.
    pub write_timeout_ms: u64,
    /// Backoff for transient persistence failures.
    pub retry: RetryConfig,
}

impl ConsumerConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            lanes: 4,
            lane_capacity: 64,
            write_timeout_ms: 5_000,
            retry: RetryConfig::default(),
        }
    }
}

/// Exponential backoff settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            min_delay_ms: 50,
            max_delay_ms: 2_000,
        }
    }
}
