//! Redis pub/sub redistribution.
//!
//! # Responsibilities
//! - Publish cleaned readings to per-source channels
//! - Subscribe the collector to those channels
//! - Re-issue subscriptions after the client reconnects
//!
//! # Design Decisions
//! - One client per unit; the subscriber client is used for nothing else
//! - Clients reconnect on their own within the configured backoff range and
//!   never give up; `max_attempts` bounds unit rebuilds in the supervisor
//! - Incoming messages are forwarded into a bounded in-process queue by a
//!   background task owned by the subscriber and aborted with it

use async_trait::async_trait;
use fred::prelude::*;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{ReconnectConfig, RedistributionConfig};
use crate::transport::{InboundMessage, MessageSource, Publisher, TransportError};

const FORWARD_CAPACITY: usize = 1024;
const BACKOFF_BASE: u32 = 2;

/// Client-level reconnect policy. Attempts are unlimited.
pub fn reconnect_policy(reconnect: &ReconnectConfig) -> ReconnectPolicy {
    let millis = |ms: u64| u32::try_from(ms).unwrap_or(u32::MAX);
    let min_delay = millis(reconnect.base_delay_ms).max(1);
    let max_delay = millis(reconnect.max_delay_ms).max(min_delay);
    ReconnectPolicy::new_exponential(0, min_delay, max_delay, BACKOFF_BASE)
}

async fn connect(
    config: &RedistributionConfig,
    reconnect: &ReconnectConfig,
) -> Result<Client, TransportError> {
    let client = Builder::from_config(Config::from_url(&config.url)?)
        .set_policy(reconnect_policy(reconnect))
        .build()?;
    client.init().await?;
    tracing::info!(url = %config.url, "Connected to Redis");
    Ok(client)
}

/// Publishes readings with `PUBLISH`.
pub struct RedisPublisher {
    client: Client,
}

impl RedisPublisher {
    pub async fn connect(
        config: &RedistributionConfig,
        reconnect: &ReconnectConfig,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            client: connect(config, reconnect).await?,
        })
    }
}

#[async_trait]
impl Publisher for RedisPublisher {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), TransportError> {
        let receivers: i64 = self.client.publish(channel, payload).await?;
        tracing::trace!(channel = %channel, receivers, "Published");
        Ok(())
    }
}

/// `SUBSCRIBE`d client delivering messages from a fixed set of channels.
pub struct RedisSubscriber {
    client: Client,
    rx: mpsc::Receiver<InboundMessage>,
    forwarder: JoinHandle<()>,
}

impl RedisSubscriber {
    pub async fn connect(
        config: &RedistributionConfig,
        reconnect: &ReconnectConfig,
        channels: Vec<String>,
    ) -> Result<Self, TransportError> {
        let client = connect(config, reconnect).await?;

        // Receivers must exist before SUBSCRIBE so no early message is missed.
        let mut messages = client.message_rx();
        let mut reconnects = client.reconnect_rx();
        client.subscribe(channels.clone()).await?;
        for channel in &channels {
            tracing::info!(channel = %channel, "Subscribed to Redis channel");
        }

        let (tx, rx) = mpsc::channel(FORWARD_CAPACITY);
        let resubscriber = client.clone();

        let forwarder = tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = messages.recv() => match message {
                        Ok(message) => {
                            let channel = message.channel.to_string();
                            let payload = match message.value.convert::<String>() {
                                Ok(payload) => payload,
                                Err(e) => {
                                    tracing::warn!(channel = %channel, error = %e, "Dropping non-text Redis message");
                                    continue;
                                }
                            };
                            if tx.send(InboundMessage::new(channel, payload)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Redis message stream lagged, messages lost");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    reconnect = reconnects.recv() => match reconnect {
                        Ok(_) | Err(RecvError::Lagged(_)) => {
                            tracing::info!("Redis reconnected, re-subscribing");
                            if let Err(e) = resubscriber.subscribe(channels.clone()).await {
                                tracing::error!(error = %e, "Failed to re-subscribe after reconnect");
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(Self {
            client,
            rx,
            forwarder,
        })
    }
}

#[async_trait]
impl MessageSource for RedisSubscriber {
    async fn recv(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        match self.rx.recv().await {
            Some(message) => Ok(Some(message)),
            None => Err(TransportError::Closed(
                "Redis subscription stream ended".to_string(),
            )),
        }
    }
}

impl Drop for RedisSubscriber {
    fn drop(&mut self) {
        self.forwarder.abort();
        let client = self.client.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = client.quit().await;
            });
        }
    }
}
