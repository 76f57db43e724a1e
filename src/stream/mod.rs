//! Inbound order stream.
//!
//! An [`OrderStream`] yields raw order payloads as they arrive. Delivery is
//! at-least-once: the same payload may arrive more than once, and the
//! consumer relies on idempotent store writes to absorb redeliveries.
//!
//! A message from a broker carries an [`Acknowledge`] handle. The consumer
//! acks only once the message is settled; an unacked message is redelivered.
//!
//! Sources:
//! - `ChannelStream`: in-process tokio channel, no acks (feature `channel`)
//! - `NatsStream`: durable JetStream pull consumer (feature `nats`)

#[cfg(feature = "channel")]
pub mod channel;
#[cfg(feature = "nats")]
pub mod nats;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

#[cfg(feature = "channel")]
pub use channel::{ChannelPublisher, ChannelStream};
#[cfg(feature = "nats")]
pub use nats::NatsStream;

/// Result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors that can occur while connecting or subscribing.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    #[error("Stream already subscribed")]
    AlreadySubscribed,

    #[error("Stream closed")]
    Closed,

    #[error("Acknowledge failed: {0}")]
    Ack(String),
}

/// Settles a message with its source.
#[async_trait]
pub trait Acknowledge: Send + Sync {
    async fn ack(&self) -> Result<()>;
}

/// One payload received from the stream.
pub struct InboundMessage {
    /// Raw payload bytes, undecoded.
    pub payload: Vec<u8>,
    pub received_at: DateTime<Utc>,
    /// `None` for sources without acknowledgement.
    pub ack: Option<Box<dyn Acknowledge>>,
}

impl InboundMessage {
    /// Wrap a payload stamped with the current time.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            received_at: Utc::now(),
            ack: None,
        }
    }

    /// Wrap a payload that must be acked once settled.
    pub fn with_ack(payload: impl Into<Vec<u8>>, ack: impl Acknowledge + 'static) -> Self {
        Self {
            ack: Some(Box::new(ack)),
            ..Self::new(payload)
        }
    }
}

impl fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundMessage")
            .field("bytes", &self.payload.len())
            .field("received_at", &self.received_at)
            .field("acked_by_source", &self.ack.is_some())
            .finish()
    }
}

/// Source of inbound order payloads.
#[async_trait]
pub trait OrderStream: Send + Sync {
    /// Start receiving. The returned stream ends when the source closes.
    async fn subscribe(&self) -> Result<BoxStream<'static, InboundMessage>>;
}
