//! Message transports.
//!
//! # Data Flow
//! ```text
//! MQTT broker ──▶ mqtt.rs (MqttSource) ──▶ Relay
//! Relay ──▶ redis.rs (RedisPublisher) ──▶ Redis pub/sub
//! Redis pub/sub ──▶ redis.rs (RedisSubscriber) ──▶ Collector
//!
//! Tests: memory.rs (MemoryPublisher ──▶ MemorySource) stands in for either hop
//! ```
//!
//! # Design Decisions
//! - Units are generic over `MessageSource` / `Publisher`, never over a client
//! - Client handles are created per unit and owned by it; no process globals
//! - A receive error ends the unit's run; the supervisor reconnects
//! - `Ok(None)` from a source means the stream ended cleanly

pub mod memory;
pub mod mqtt;
pub mod redis;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{MemoryPublisher, MemorySource};
pub use mqtt::MqttSource;
pub use redis::{RedisPublisher, RedisSubscriber};

/// Errors raised by transport clients.
#[derive(Debug, Error)]
pub enum TransportError {
    /// MQTT event loop failed (connect, network, protocol).
    #[error("MQTT connection error: {0}")]
    MqttConnection(#[from] rumqttc::ConnectionError),

    /// MQTT request could not be queued.
    #[error("MQTT client error: {0}")]
    MqttClient(#[from] rumqttc::ClientError),

    /// Redis command or connection failed.
    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),

    /// The other side of an in-process channel went away.
    #[error("Channel closed: {0}")]
    Closed(String),
}

impl TransportError {
    /// Whether the error means the connection itself is gone, as opposed to
    /// one rejected command.
    pub fn is_connection(&self) -> bool {
        use fred::error::ErrorKind;

        match self {
            TransportError::MqttConnection(_) | TransportError::MqttClient(_) => true,
            TransportError::Redis(e) => matches!(
                e.kind(),
                ErrorKind::IO
                    | ErrorKind::Canceled
                    | ErrorKind::Timeout
                    | ErrorKind::Routing
                    | ErrorKind::Protocol
            ),
            TransportError::Closed(_) => true,
        }
    }
}

/// A message as received from any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic or channel the message arrived on.
    pub channel: String,

    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(channel: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

/// A subscription delivering messages one at a time, in arrival order.
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next message. `Ok(None)` once the source is exhausted.
    async fn recv(&mut self) -> Result<Option<InboundMessage>, TransportError>;
}

/// Fire-and-forget publishing to a named channel.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: MessageSource + ?Sized> MessageSource for Box<T> {
    async fn recv(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        (**self).recv().await
    }
}

#[async_trait]
impl<T: Publisher + ?Sized> Publisher for std::sync::Arc<T> {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), TransportError> {
        (**self).publish(channel, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fred::error::{Error, ErrorKind};

    #[test]
    fn test_connection_errors_are_classified() {
        assert!(TransportError::Closed("gone".into()).is_connection());
        assert!(TransportError::Redis(Error::new(ErrorKind::IO, "reset")).is_connection());
        assert!(TransportError::Redis(Error::new(ErrorKind::Canceled, "quit")).is_connection());
        assert!(!TransportError::Redis(Error::new(ErrorKind::InvalidArgument, "bad")).is_connection());
    }
}
