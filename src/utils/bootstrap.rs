//! Bootstrap utilities for orderstream binaries.

use std::future::Future;

use backon::Retryable;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::retry::connection_backoff;
use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the ORDERSTREAM_LOG environment variable.
///
/// Defaults to "info" level if ORDERSTREAM_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect to an external service with exponential backoff retry.
///
/// # Arguments
/// * `service_name` - Human-readable name for logging (e.g., "postgres", "nats")
/// * `connect` - Async function that attempts to establish a connection
///
/// # Returns
/// The connection on success, or the last error after max retries.
pub async fn connect_with_retry<T, E, F, Fut>(service_name: &str, connect: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let result = connect
        .retry(connection_backoff())
        .notify(|err: &E, dur| {
            warn!(
                service = service_name,
                error = %err,
                retry_in = ?dur,
                "Connection failed, retrying"
            );
        })
        .await;

    match &result {
        Ok(_) => info!(service = service_name, "Connected"),
        Err(e) => tracing::error!(service = service_name, error = %e, "Giving up on connection"),
    }

    result
}

/// Completes on Ctrl+C.
pub async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Completes when `signal` fires. If the signal cannot be listened for,
/// never completes: the caller keeps running until its input ends.
pub async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal, ignoring it");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_shutdown_completes_on_signal() {
        let signalled = async { Ok::<(), std::io::Error>(()) };

        tokio::time::timeout(Duration::from_secs(1), wait_for_shutdown(signalled))
            .await
            .expect("shutdown should complete once signalled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_registration_failure_does_not_shut_down() {
        let failed = async { Err::<(), _>(std::io::Error::other("no signal handler")) };

        let waited = tokio::time::timeout(Duration::from_secs(3600), wait_for_shutdown(failed)).await;

        assert!(waited.is_err(), "a failed listener must not trigger shutdown");
    }
}
