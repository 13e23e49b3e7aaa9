//! In-process transport over a tokio channel.
//!
//! Used by tests and by anything that wants to drive a unit without a broker.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::mpsc;

use crate::transport::{InboundMessage, MessageSource, Publisher, TransportError};

/// Create a connected publisher/source pair.
pub fn channel(capacity: usize) -> (MemoryPublisher, MemorySource) {
    let (tx, rx) = mpsc::channel(capacity);
    (MemoryPublisher { tx }, MemorySource { rx, filter: None })
}

/// Sending half. Cloneable.
#[derive(Debug, Clone)]
pub struct MemoryPublisher {
    tx: mpsc::Sender<InboundMessage>,
}

impl MemoryPublisher {
    /// Push a raw payload, as a producer would.
    pub async fn send(
        &self,
        channel: &str,
        payload: impl Into<Vec<u8>>,
    ) -> Result<(), TransportError> {
        self.tx
            .send(InboundMessage::new(channel, payload))
            .await
            .map_err(|_| TransportError::Closed(channel.to_string()))
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), TransportError> {
        self.send(channel, payload).await
    }
}

/// Receiving half. Optionally limited to a set of channels, like a
/// pub/sub subscription.
#[derive(Debug)]
pub struct MemorySource {
    rx: mpsc::Receiver<InboundMessage>,
    filter: Option<HashSet<String>>,
}

impl MemorySource {
    /// Deliver only messages published on `channels`; others are discarded.
    pub fn subscribe(mut self, channels: impl IntoIterator<Item = String>) -> Self {
        self.filter = Some(channels.into_iter().collect());
        self
    }
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn recv(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        while let Some(message) = self.rx.recv().await {
            match &self.filter {
                Some(channels) if !channels.contains(&message.channel) => continue,
                _ => return Ok(Some(message)),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delivery_in_order() {
        let (publisher, mut source) = channel(8);
        publisher.publish("a", "1".into()).await.unwrap();
        publisher.publish("a", "2".into()).await.unwrap();
        drop(publisher);

        assert_eq!(source.recv().await.unwrap().unwrap().payload, b"1");
        assert_eq!(source.recv().await.unwrap().unwrap().payload, b"2");
        assert!(source.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_subscription_filter() {
        let (publisher, source) = channel(8);
        let mut source = source.subscribe(["wanted".to_string()]);
        publisher.publish("other", "x".into()).await.unwrap();
        publisher.publish("wanted", "y".into()).await.unwrap();
        drop(publisher);

        let message = source.recv().await.unwrap().unwrap();
        assert_eq!(message.channel, "wanted");
        assert!(source.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publish_after_close_fails() {
        let (publisher, source) = channel(1);
        drop(source);
        let err = publisher.publish("a", "x".into()).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed(_)));
    }
}
