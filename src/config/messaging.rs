//! Inbound stream configuration types.

use serde::Deserialize;

/// Messaging type discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagingType {
    /// In-process channel (no external broker).
    #[default]
    Channel,
    /// NATS JetStream durable consumer.
    Nats,
}

/// Messaging configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Messaging type discriminator.
    #[serde(rename = "type")]
    pub messaging_type: MessagingType,
    /// Channel-specific configuration.
    pub channel: ChannelConfig,
    /// NATS-specific configuration.
    pub nats: NatsConfig,
}

/// Channel-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Buffered messages before publishers wait.
    pub capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// NATS-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// NATS server URL.
    pub url: String,
    /// Subject carrying order payloads.
    pub subject: String,
    /// JetStream stream capturing `subject`, created if missing.
    pub stream: String,
    /// Durable consumer name; redeliveries resume from its ack state.
    pub durable: String,
    /// Seconds before an unacked message is redelivered.
    pub ack_wait_secs: u64,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            subject: "data".to_string(),
            stream: "ORDERS".to_string(),
            durable: "orderstream".to_string(),
            ack_wait_secs: 30,
        }
    }
}
