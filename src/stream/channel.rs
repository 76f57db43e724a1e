//! In-memory channel order stream for standalone mode.
//!
//! Uses a bounded tokio mpsc channel within a single process. Ideal for
//! local development and testing without an external broker.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use super::{InboundMessage, OrderStream, Result, StreamError};

/// Create a linked publisher and stream.
///
/// `capacity` bounds the number of buffered payloads; publishers wait when
/// the buffer is full.
pub fn channel(capacity: usize) -> (ChannelPublisher, ChannelStream) {
    let (sender, receiver) = mpsc::channel(capacity);

    info!(capacity, "Channel order stream initialized");

    (
        ChannelPublisher { sender },
        ChannelStream {
            receiver: Mutex::new(Some(receiver)),
        },
    )
}

/// Sending half. Cloneable; the stream ends once every clone is dropped.
#[derive(Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<InboundMessage>,
}

impl ChannelPublisher {
    /// Publish a raw payload.
    pub async fn publish(&self, payload: impl Into<Vec<u8>>) -> Result<()> {
        let message = InboundMessage::new(payload);
        debug!(bytes = message.payload.len(), "Publishing to channel stream");
        self.sender
            .send(message)
            .await
            .map_err(|_| StreamError::Closed)
    }
}

/// Receiving half. Supports a single subscription.
pub struct ChannelStream {
    receiver: Mutex<Option<mpsc::Receiver<InboundMessage>>>,
}

#[async_trait]
impl OrderStream for ChannelStream {
    async fn subscribe(&self) -> Result<BoxStream<'static, InboundMessage>> {
        let receiver = self
            .receiver
            .lock()
            .await
            .take()
            .ok_or(StreamError::AlreadySubscribed)?;

        Ok(stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|message| (message, receiver))
        })
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_then_receive_in_order() {
        let (publisher, stream) = channel(8);
        let messages = stream.subscribe().await.unwrap();

        publisher.publish(b"one".to_vec()).await.unwrap();
        publisher.publish("two").await.unwrap();
        drop(publisher);

        let received: Vec<_> = messages.map(|m| m.payload).collect().await;
        assert_eq!(received, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[tokio::test]
    async fn test_stream_ends_when_publishers_dropped() {
        let (publisher, stream) = channel(8);
        let mut messages = stream.subscribe().await.unwrap();
        drop(publisher);

        assert!(messages.next().await.is_none());
    }

    #[tokio::test]
    async fn test_second_subscribe_rejected() {
        let (_publisher, stream) = channel(8);
        let _first = stream.subscribe().await.unwrap();

        assert!(matches!(
            stream.subscribe().await,
            Err(StreamError::AlreadySubscribed)
        ));
    }

    #[tokio::test]
    async fn test_publish_after_stream_dropped_fails() {
        let (publisher, stream) = channel(8);
        drop(stream);

        assert!(matches!(
            publisher.publish("x").await,
            Err(StreamError::Closed)
        ));
    }
}
