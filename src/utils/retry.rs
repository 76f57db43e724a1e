//! Retry utilities: backoff builders.
//!
//! Uses `backon` for exponential backoff with jitter. Provides the backoff
//! for transient persistence failures and for connection retries at startup.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::config::RetryConfig;

/// Backoff for transient store and sink failures, from configuration.
pub fn persistence_backoff(config: &RetryConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(config.min_delay_ms))
        .with_max_delay(Duration::from_millis(config.max_delay_ms))
        .with_max_times(config.max_retries)
        .with_jitter()
}

/// Backoff for storage and broker connection retries at startup.
///
/// - Min delay: 100ms
/// - Max delay: 5s
/// - Max attempts: 30
/// - Jitter enabled
pub fn connection_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(30)
        .with_jitter()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use backon::Retryable;

    use super::*;

    fn fast(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            min_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[tokio::test]
    async fn test_persistence_backoff_bounds_attempts() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), &str> = (|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down")
        })
        .retry(persistence_backoff(&fast(3)))
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_persistence_backoff_stops_on_success() {
        let calls = AtomicUsize::new(0);

        let result: Result<usize, &str> = (|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err("down")
            } else {
                Ok(n)
            }
        })
        .retry(persistence_backoff(&fast(5)))
        .await;

        assert_eq!(result, Ok(2));
    }
}
