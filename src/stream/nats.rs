//! NATS JetStream order stream.
//!
//! Payloads published on the configured subject are captured by a
//! JetStream stream and read through a durable pull consumer with explicit
//! acks. A message that is never acked is redelivered after `ack_wait`.

use std::time::Duration;

use async_nats::jetstream::{
    self,
    consumer::{pull::Config as ConsumerConfig, AckPolicy, DeliverPolicy},
    stream::{Config as StreamConfig, StorageType},
    Context,
};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tracing::{info, warn};

use super::{Acknowledge, InboundMessage, OrderStream, Result, StreamError};
use crate::config::NatsConfig;

/// Order stream backed by a durable JetStream consumer.
pub struct NatsStream {
    jetstream: Context,
    config: NatsConfig,
}

impl NatsStream {
    /// Connect to a NATS server.
    pub async fn connect(config: &NatsConfig) -> Result<Self> {
        let client = async_nats::connect(&config.url).await.map_err(|e| {
            StreamError::Connection(format!("Failed to connect to {}: {}", config.url, e))
        })?;

        Ok(Self::new(client, config.clone()))
    }

    /// Wrap an existing client.
    pub fn new(client: async_nats::Client, config: NatsConfig) -> Self {
        Self {
            jetstream: jetstream::new(client),
            config,
        }
    }
}

#[async_trait]
impl OrderStream for NatsStream {
    async fn subscribe(&self) -> Result<BoxStream<'static, InboundMessage>> {
        let config = &self.config;

        let stream = self
            .jetstream
            .get_or_create_stream(StreamConfig {
                name: config.stream.clone(),
                subjects: vec![config.subject.clone()],
                storage: StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(|e| StreamError::Subscribe(format!("Failed to create stream: {}", e)))?;

        let consumer = stream
            .get_or_create_consumer(
                &config.durable,
                ConsumerConfig {
                    durable_name: Some(config.durable.clone()),
                    filter_subject: config.subject.clone(),
                    deliver_policy: DeliverPolicy::All,
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_secs),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| StreamError::Subscribe(format!("Failed to create consumer: {}", e)))?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| StreamError::Subscribe(format!("Failed to get message stream: {}", e)))?;

        info!(
            subject = %config.subject,
            stream = %config.stream,
            durable = %config.durable,
            "Subscribed to JetStream consumer"
        );

        Ok(messages
            .filter_map(|message| async move {
                match message {
                    Ok(message) => Some(InboundMessage::with_ack(
                        message.payload.to_vec(),
                        JetStreamAck(message),
                    )),
                    Err(e) => {
                        warn!(error = %e, "Failed to receive JetStream message");
                        None
                    }
                }
            })
            .boxed())
    }
}

struct JetStreamAck(jetstream::Message);

#[async_trait]
impl Acknowledge for JetStreamAck {
    async fn ack(&self) -> Result<()> {
        self.0
            .ack()
            .await
            .map_err(|e| StreamError::Ack(e.to_string()))
    }
}
