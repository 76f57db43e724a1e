//! orderstream: order ingestion service
//!
//! Connects storage, hydrates the order cache, then consumes the inbound
//! stream until it ends or Ctrl+C is received.
//!
//! ## Usage
//! ```text
//! orderstream [config.yaml]
//! ```
//!
//! ## Configuration
//! ```yaml
//! storage:
//!   type: sqlite          # sqlite | postgres
//!   sqlite:
//!     path: data/orders.db
//!   postgres:
//!     uri: postgres://localhost:5432/orders
//!
//! messaging:
//!   type: channel         # channel | nats
//!   nats:
//!     url: nats://localhost:4222
//!     subject: data
//!     stream: ORDERS      # JetStream stream, created if missing
//!     durable: orderstream
//!
//! consumer:
//!   lanes: 4
//!   lane_capacity: 64
//!   write_timeout_ms: 5000
//!   retry:
//!     max_retries: 5
//! ```
//!
//! With `messaging.type: channel` each line read from stdin is one payload.

use tracing::info;

use orderstream::cache::hydrate;
use orderstream::config::{Config, MessagingConfig, MessagingType};
use orderstream::consumer::OrderConsumer;
use orderstream::storage::init_storage;
use orderstream::stream::OrderStream;
use orderstream::utils::bootstrap::{connect_with_retry, init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;

    let (store, sink) = connect_with_retry("storage", || init_storage(&config.storage)).await?;

    let hydrated = hydrate(store.as_ref()).await?;
    info!(
        loaded = hydrated.report().loaded,
        skipped = hydrated.report().skipped,
        "Hydration complete"
    );

    let stream = connect_stream(&config.messaging).await?;

    let consumer = OrderConsumer::new(store, sink, hydrated.cache().clone(), config.consumer);
    let stats = consumer
        .run_until(stream.as_ref(), shutdown_signal())
        .await?;

    info!(
        persisted = stats.persisted,
        duplicates = stats.duplicates,
        quarantined = stats.quarantined,
        failed = stats.failed,
        "orderstream stopped"
    );

    Ok(())
}

async fn connect_stream(
    config: &MessagingConfig,
) -> Result<Box<dyn OrderStream>, Box<dyn std::error::Error>> {
    match config.messaging_type {
        #[cfg(feature = "channel")]
        MessagingType::Channel => {
            use tokio::io::{AsyncBufReadExt, BufReader};

            let (publisher, stream) = orderstream::stream::channel::channel(config.channel.capacity);

            tokio::spawn(async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if publisher.publish(line).await.is_err() {
                        break;
                    }
                }
                info!("stdin closed");
            });

            info!("Stream: stdin channel");
            Ok(Box::new(stream))
        }
        #[cfg(feature = "nats")]
        MessagingType::Nats => {
            use orderstream::stream::NatsStream;

            let stream = connect_with_retry("nats", || NatsStream::connect(&config.nats)).await?;

            info!(subject = %config.nats.subject, "Stream: nats jetstream");
            Ok(Box::new(stream))
        }
        #[allow(unreachable_patterns)]
        ref other => Err(format!("Messaging backend {:?} not enabled in this build", other).into()),
    }
}
