//! MQTT ingest subscription.

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::transport::{InboundMessage, MessageSource, TransportError};

/// Subscription to the producers' MQTT topics.
///
/// Topics are (re)subscribed on every `CONNACK`, so a broker reconnect
/// handled inside the event loop keeps the subscription alive.
pub struct MqttSource {
    client: AsyncClient,
    eventloop: EventLoop,
    topics: Vec<String>,
    qos: QoS,
}

impl MqttSource {
    /// Create the client. No network I/O happens until the first `recv`.
    pub fn new(config: &IngestConfig) -> Self {
        let client_id = format!("{}-{}", config.client_id, Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, eventloop) = AsyncClient::new(options, config.channel_capacity);

        Self {
            client,
            eventloop,
            topics: config
                .topics
                .iter()
                .filter(|t| !t.trim().is_empty())
                .cloned()
                .collect(),
            qos: qos_from_level(config.qos),
        }
    }

    fn subscribe_all(&self) -> Result<(), TransportError> {
        for topic in &self.topics {
            self.client.try_subscribe(topic.as_str(), self.qos)?;
            tracing::info!(topic = %topic, "Subscribed to MQTT topic");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSource for MqttSource {
    async fn recv(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        loop {
            match self.eventloop.poll().await? {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    tracing::info!(code = ?ack.code, "Connected to MQTT broker");
                    self.subscribe_all()?;
                }
                Event::Incoming(Packet::Publish(publish)) => {
                    return Ok(Some(InboundMessage {
                        channel: publish.topic,
                        payload: publish.payload.to_vec(),
                    }));
                }
                Event::Incoming(Packet::Disconnect) => {
                    tracing::warn!("MQTT broker sent disconnect");
                }
                _ => {}
            }
        }
    }
}

fn qos_from_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_mapping() {
        assert_eq!(qos_from_level(0), QoS::AtMostOnce);
        assert_eq!(qos_from_level(1), QoS::AtLeastOnce);
        assert_eq!(qos_from_level(2), QoS::ExactlyOnce);
    }

    #[test]
    fn test_blank_topics_are_skipped() {
        let config = IngestConfig {
            topics: vec!["wind/turbine/data/T101".into(), " ".into()],
            ..IngestConfig::default()
        };
        let source = MqttSource::new(&config);
        assert_eq!(source.topics, vec!["wind/turbine/data/T101".to_string()]);
    }
}
