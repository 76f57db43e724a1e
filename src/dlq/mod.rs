//! Dead letter infrastructure.
//!
//! Messages whose processing still fails after the retry policy are handed
//! to a [`DeadLetterPublisher`] for manual review and replay. A dead letter
//! carries the raw inbound payload, so replaying it means publishing the
//! payload back onto the inbound stream.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::storage::StorageError;

/// Errors that can occur during DLQ operations.
#[derive(Debug, thiserror::Error)]
pub enum DlqError {
    #[error("Failed to publish to DLQ: {0}")]
    PublishFailed(String),
}

/// Pipeline stage that gave up on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    /// Writing a decoded order to the store.
    Persist,
    /// Appending an undecodable payload to the invalid sink.
    Quarantine,
}

impl FailedStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedStage::Persist => "persist",
            FailedStage::Quarantine => "quarantine",
        }
    }
}

/// Dead letter entry for a message that could not be processed.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    /// Order identifier, when the payload decoded.
    pub order_uid: Option<String>,
    /// Raw inbound payload.
    pub payload: Vec<u8>,
    pub stage: FailedStage,
    /// Human-readable reason for the failure.
    pub reason: String,
    /// Attempts made, including the first.
    pub attempts: usize,
    /// Whether the last error was transient (a later replay may succeed).
    pub is_transient: bool,
    pub occurred_at: DateTime<Utc>,
}

impl DeadLetter {
    /// Create a dead letter from a failed store write.
    pub fn from_persist_failure(
        order_uid: &str,
        payload: &[u8],
        err: &StorageError,
        attempts: usize,
    ) -> Self {
        Self {
            order_uid: Some(order_uid.to_string()),
            payload: payload.to_vec(),
            stage: FailedStage::Persist,
            reason: format!("Persist failed after {} attempts: {}", attempts, err),
            attempts,
            is_transient: err.is_transient(),
            occurred_at: Utc::now(),
        }
    }

    /// Create a dead letter from a failed invalid-sink append.
    pub fn from_quarantine_failure(payload: &[u8], err: &StorageError, attempts: usize) -> Self {
        Self {
            order_uid: None,
            payload: payload.to_vec(),
            stage: FailedStage::Quarantine,
            reason: format!("Quarantine failed after {} attempts: {}", attempts, err),
            attempts,
            is_transient: err.is_transient(),
            occurred_at: Utc::now(),
        }
    }
}

/// Trait for publishing messages to a dead letter queue.
#[async_trait]
pub trait DeadLetterPublisher: Send + Sync {
    /// Publish a dead letter to the queue.
    async fn publish(&self, dead_letter: DeadLetter) -> Result<(), DlqError>;
}

/// Publisher that records dead letters in the error log only.
///
/// Default when no DLQ destination is wired in.
pub struct LoggingDeadLetterPublisher;

#[async_trait]
impl DeadLetterPublisher for LoggingDeadLetterPublisher {
    async fn publish(&self, dead_letter: DeadLetter) -> Result<(), DlqError> {
        error!(
            order_uid = dead_letter.order_uid.as_deref().unwrap_or("-"),
            stage = dead_letter.stage.as_str(),
            attempts = dead_letter.attempts,
            transient = dead_letter.is_transient,
            bytes = dead_letter.payload.len(),
            reason = %dead_letter.reason,
            "Dead letter"
        );
        Ok(())
    }
}

/// In-memory DLQ publisher using a channel.
///
/// Used for embedding and testing.
pub struct ChannelDeadLetterPublisher {
    sender: mpsc::UnboundedSender<DeadLetter>,
}

impl ChannelDeadLetterPublisher {
    /// Create a new channel-based DLQ publisher.
    ///
    /// Returns the publisher and a receiver for consuming dead letters.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeadLetter>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl DeadLetterPublisher for ChannelDeadLetterPublisher {
    async fn publish(&self, dead_letter: DeadLetter) -> Result<(), DlqError> {
        info!(
            stage = dead_letter.stage.as_str(),
            reason = %dead_letter.reason,
            "Publishing to channel DLQ"
        );
        self.sender
            .send(dead_letter)
            .map_err(|e| DlqError::PublishFailed(e.to_string()))
    }
}
