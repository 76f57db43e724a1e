//! Order message consumer.
//!
//! Each inbound payload moves through
//! `Received -> Decoding -> {Valid -> Persisting -> Persisted&Cached | Invalid -> Sunk}`,
//! ending in `Failed` when storage errors outlast the retry policy.
//!
//! Valid orders are written to the [`OrderStore`] first; the cache is
//! updated only after the write succeeds. Undecodable payloads go to the
//! [`InvalidSink`] and never touch the store or the cache. Failures reach
//! one policy point ([`OrderConsumer::run`]) which dead-letters and counts
//! them.
//!
//! Messages from acknowledging sources are acked once settled: persisted,
//! quarantined, or dead-lettered. If the dead letter cannot be published
//! the message stays unacked and the source redelivers it.
//!
//! Decoded orders are routed to a fixed number of lanes by identifier hash,
//! so writes for one identifier are serialized while different identifiers
//! proceed in parallel.

mod lanes;

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::cache::OrderCache;
use crate::config::ConsumerConfig;
use crate::dlq::{DeadLetter, DeadLetterPublisher, LoggingDeadLetterPublisher};
use crate::order::{decode, CachedOrder, Order};
use crate::storage::{InvalidRecord, InvalidSink, OrderStore, StorageError, WriteOutcome};
use crate::stream::{Acknowledge, InboundMessage, OrderStream, StreamError};
use crate::utils::retry::persistence_backoff;

use lanes::{LaneJob, Lanes};

/// Terminal state of a successfully processed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Written to the store, then cached.
    Persisted { order_uid: String },
    /// Identifier already stored; nothing written.
    Duplicate { order_uid: String },
    /// Payload failed decoding and was appended to the invalid sink.
    Quarantined { reason: String },
}

/// A message that reached the `Failed` state.
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    #[error("Failed to persist order {order_uid} after {attempts} attempts: {source}")]
    Persist {
        order_uid: String,
        attempts: usize,
        #[source]
        source: StorageError,
    },

    #[error("Failed to quarantine payload after {attempts} attempts: {source}")]
    Quarantine {
        attempts: usize,
        #[source]
        source: StorageError,
    },
}

impl ConsumerError {
    /// Dead letter carrying the original payload.
    pub fn to_dead_letter(&self, payload: &[u8]) -> DeadLetter {
        match self {
            ConsumerError::Persist {
                order_uid,
                attempts,
                source,
            } => DeadLetter::from_persist_failure(order_uid, payload, source, *attempts),
            ConsumerError::Quarantine { attempts, source } => {
                DeadLetter::from_quarantine_failure(payload, source, *attempts)
            }
        }
    }
}

/// Message counts from one consumer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub received: usize,
    pub persisted: usize,
    pub duplicates: usize,
    pub quarantined: usize,
    pub failed: usize,
}

impl ConsumerStats {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Persisted { .. } => self.persisted += 1,
            Outcome::Duplicate { .. } => self.duplicates += 1,
            Outcome::Quarantined { .. } => self.quarantined += 1,
        }
    }

    fn merge(&mut self, other: ConsumerStats) {
        self.received += other.received;
        self.persisted += other.persisted;
        self.duplicates += other.duplicates;
        self.quarantined += other.quarantined;
        self.failed += other.failed;
    }
}

/// A decoded order together with its cached form.
///
/// The cached form is produced before the write, so a successful write can
/// always be followed by a cache update.
struct PreparedOrder {
    order: Order,
    cached: CachedOrder,
}

fn prepare(raw: &[u8]) -> Result<PreparedOrder, String> {
    let order = decode(raw).map_err(|e| e.to_string())?;
    let cached = order
        .to_cached()
        .map_err(|e| format!("Failed to serialize order: {}", e))?;
    Ok(PreparedOrder { order, cached })
}

/// Routes inbound payloads to the store and cache, or to the invalid sink.
///
/// Clones share the same store, sink, cache and dead letter publisher.
#[derive(Clone)]
pub struct OrderConsumer {
    store: Arc<dyn OrderStore>,
    sink: Arc<dyn InvalidSink>,
    cache: OrderCache,
    dead_letters: Arc<dyn DeadLetterPublisher>,
    config: ConsumerConfig,
}

impl OrderConsumer {
    /// Create a consumer that logs dead letters.
    pub fn new(
        store: Arc<dyn OrderStore>,
        sink: Arc<dyn InvalidSink>,
        cache: OrderCache,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            store,
            sink,
            cache,
            dead_letters: Arc::new(LoggingDeadLetterPublisher),
            config,
        }
    }

    /// Send dead letters to the given publisher.
    pub fn with_dead_letters(mut self, publisher: Arc<dyn DeadLetterPublisher>) -> Self {
        self.dead_letters = publisher;
        self
    }

    pub fn cache(&self) -> &OrderCache {
        &self.cache
    }

    /// Consume the stream until it ends.
    pub async fn run(&self, stream: &dyn OrderStream) -> Result<ConsumerStats, StreamError> {
        self.run_until(stream, std::future::pending()).await
    }

    /// Consume the stream until it ends or `shutdown` completes.
    ///
    /// Queued lane work is drained before returning.
    pub async fn run_until<F>(
        &self,
        stream: &dyn OrderStream,
        shutdown: F,
    ) -> Result<ConsumerStats, StreamError>
    where
        F: Future<Output = ()>,
    {
        let mut messages = stream.subscribe().await?;
        let lanes = Lanes::spawn(self, self.config.lanes, self.config.lane_capacity);
        let mut stats = ConsumerStats::default();

        info!(
            lanes = lanes.len(),
            lane_capacity = self.config.lane_capacity,
            "Consumer started"
        );

        tokio::pin!(shutdown);

        loop {
            let message = tokio::select! {
                message = messages.next() => match message {
                    Some(message) => message,
                    None => {
                        info!("Order stream ended");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            };

            stats.received += 1;
            self.intake(&lanes, message, &mut stats).await;
        }

        stats.merge(lanes.shutdown().await);

        info!(
            received = stats.received,
            persisted = stats.persisted,
            duplicates = stats.duplicates,
            quarantined = stats.quarantined,
            failed = stats.failed,
            "Consumer stopped"
        );

        Ok(stats)
    }

    async fn intake(&self, lanes: &Lanes, message: InboundMessage, stats: &mut ConsumerStats) {
        let InboundMessage {
            payload,
            received_at,
            ack,
        } = message;

        match prepare(&payload) {
            Ok(prepared) => {
                let job = LaneJob {
                    order: prepared.order,
                    cached: prepared.cached,
                    payload,
                    ack,
                };
                lanes.dispatch(job, stats).await;
            }
            Err(reason) => {
                let result = self.quarantine(&payload, reason, received_at).await;
                let settled = self.settle(result, &payload, stats).await;
                acknowledge(ack, settled).await;
            }
        }
    }

    /// Process one payload through the full state machine.
    ///
    /// Failures are returned, not dead-lettered.
    #[tracing::instrument(name = "consumer.handle", skip_all, fields(bytes = raw.len()))]
    pub async fn handle(&self, raw: &[u8]) -> Result<Outcome, ConsumerError> {
        debug!("Decoding payload");
        match prepare(raw) {
            Ok(prepared) => self.persist(prepared.order, prepared.cached).await,
            Err(reason) => self.quarantine(raw, reason, Utc::now()).await,
        }
    }

    /// Top-level failure policy: count, dead-letter.
    ///
    /// Returns whether the message is settled: handled, or its dead letter
    /// was published. An unsettled message is left for redelivery.
    async fn settle(
        &self,
        result: Result<Outcome, ConsumerError>,
        payload: &[u8],
        stats: &mut ConsumerStats,
    ) -> bool {
        match result {
            Ok(outcome) => {
                stats.record(&outcome);
                true
            }
            Err(err) => {
                stats.failed += 1;
                error!(error = %err, "Message failed");
                match self.dead_letters.publish(err.to_dead_letter(payload)).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!(error = %e, "Failed to publish dead letter");
                        false
                    }
                }
            }
        }
    }

    async fn persist(&self, order: Order, cached: CachedOrder) -> Result<Outcome, ConsumerError> {
        let order = Arc::new(order);
        let order_uid = order.order_uid.clone();

        debug!(order_uid = %order_uid, "Persisting order");
        let (result, attempts) = self
            .retry_storage("write", &order_uid, || self.write_once(order.clone()))
            .await;

        match result {
            Ok(WriteOutcome::Created) => {
                self.cache.set(order_uid.clone(), cached);
                info!(order_uid = %order_uid, "Order persisted and cached");
                Ok(Outcome::Persisted { order_uid })
            }
            Ok(WriteOutcome::Duplicate) => {
                debug!(order_uid = %order_uid, "Duplicate delivery");
                if !self.cache.contains(&order_uid) {
                    self.recache(&order_uid).await?;
                }
                Ok(Outcome::Duplicate { order_uid })
            }
            Err(source) => Err(ConsumerError::Persist {
                order_uid,
                attempts,
                source,
            }),
        }
    }

    /// Cache the stored aggregate for an identifier the cache does not hold.
    async fn recache(&self, order_uid: &str) -> Result<(), ConsumerError> {
        let (result, attempts) = self
            .retry_storage("read", order_uid, || self.store.read(order_uid))
            .await;

        let cached = result.and_then(|stored| {
            stored.to_cached().map_err(|e| StorageError::Corrupt {
                key: order_uid.to_string(),
                reason: e.to_string(),
            })
        });

        match cached {
            Ok(cached) => {
                self.cache.set(order_uid, cached);
                info!(order_uid = %order_uid, "Cached stored order after duplicate delivery");
                Ok(())
            }
            Err(source) => Err(ConsumerError::Persist {
                order_uid: order_uid.to_string(),
                attempts,
                source,
            }),
        }
    }

    /// One store write bounded by the write timeout.
    ///
    /// The write runs in its own task: on timeout it keeps running to
    /// completion, and a retry then sees it as a duplicate.
    async fn write_once(&self, order: Arc<Order>) -> Result<WriteOutcome, StorageError> {
        let timeout = self.config.write_timeout();
        let store = self.store.clone();
        let write = tokio::spawn(async move { store.write(&order).await });

        match tokio::time::timeout(timeout, write).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(StorageError::Unavailable(format!("write task failed: {}", e))),
            Err(_) => Err(StorageError::Timeout(timeout)),
        }
    }

    async fn quarantine(
        &self,
        raw: &[u8],
        reason: String,
        received_at: DateTime<Utc>,
    ) -> Result<Outcome, ConsumerError> {
        warn!(reason = %reason, bytes = raw.len(), "Invalid payload, quarantining");

        let record = InvalidRecord {
            payload: raw.to_vec(),
            reason,
            received_at,
        };
        let (result, attempts) = self
            .retry_storage("append", "-", || self.sink.append(&record))
            .await;

        match result {
            Ok(()) => Ok(Outcome::Quarantined {
                reason: record.reason,
            }),
            Err(source) => Err(ConsumerError::Quarantine { attempts, source }),
        }
    }

    /// Run a storage operation, retrying transient failures with backoff.
    ///
    /// Returns the final result and the number of attempts made.
    async fn retry_storage<T, F, Fut>(
        &self,
        operation: &'static str,
        order_uid: &str,
        mut op: F,
    ) -> (Result<T, StorageError>, usize)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let attempts = AtomicUsize::new(0);

        let result = (|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            op()
        })
        .retry(persistence_backoff(&self.config.retry))
        .when(StorageError::is_transient)
        .notify(|err: &StorageError, dur: Duration| {
            warn!(
                operation,
                order_uid,
                error = %err,
                retry_in = ?dur,
                "Transient storage failure, retrying"
            );
        })
        .await;

        (result, attempts.load(Ordering::SeqCst))
    }
}

/// Ack a settled message with its source. Unsettled messages stay unacked.
async fn acknowledge(ack: Option<Box<dyn Acknowledge>>, settled: bool) {
    let Some(ack) = ack else {
        return;
    };

    if !settled {
        warn!("Message not settled, leaving it for redelivery");
        return;
    }

    if let Err(e) = ack.ack().await {
        warn!(error = %e, "Failed to acknowledge message");
    }
}
