//! Relay: MQTT ingest to Redis redistribution.
//!
//! # Responsibilities
//! - Rewrite bare non-finite tokens so producer payloads decode
//! - Resolve the source and its redistribution channel
//! - Clean the sample and publish the encoded reading
//!
//! # Design Decisions
//! - Messages are handled one at a time in arrival order
//! - Every per-message failure is logged, counted and skipped, except a
//!   publish that failed because the connection is gone: that ends the run
//!   so the supervisor reconnects

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::cleaner::sanitize::sanitize_non_finite;
use crate::cleaner::Cleaner;
use crate::model::{IngestMessage, MessageError, Reading};
use crate::observability::metrics;
use crate::routing::RoutingTable;
use crate::transport::{InboundMessage, MessageSource, Publisher, TransportError};
use crate::units::{Unit, UnitError};

const UNIT: &str = "relay";

/// Why a message was not relayed.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Message(#[from] MessageError),

    #[error("no route for source '{0}'")]
    UnknownSource(String),

    #[error("failed to encode reading: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("publish failed: {0}")]
    Publish(#[from] TransportError),
}

impl RelayError {
    /// Metric label for the drop reason.
    pub fn reason(&self) -> &'static str {
        match self {
            RelayError::Message(MessageError::MissingSourceId) => "missing_source",
            RelayError::Message(_) => "malformed",
            RelayError::UnknownSource(_) => "unrouted",
            RelayError::Encode(_) => "encode",
            RelayError::Publish(_) => "publish",
        }
    }
}

/// Per-message relay logic, separate from the source it reads.
struct Forwarder<P> {
    publisher: P,
    routes: Arc<RoutingTable>,
    cleaner: Cleaner,
}

impl<P: Publisher> Forwarder<P> {
    async fn forward(&self, message: &InboundMessage) -> Result<(Reading, String), RelayError> {
        let text = std::str::from_utf8(&message.payload).map_err(MessageError::from)?;
        let sample = IngestMessage::from_json(&sanitize_non_finite(text))?.into_sample()?;

        let channel = self
            .routes
            .channel_for(&sample.source_id)
            .ok_or_else(|| RelayError::UnknownSource(sample.source_id.clone()))?
            .to_string();

        let reading = self.cleaner.clean(sample);
        self.publisher.publish(&channel, reading.to_json()?).await?;

        tracing::debug!(
            source_id = %reading.source_id,
            channel = %channel,
            sequence = ?reading.sequence,
            "Reading relayed"
        );
        metrics::record_forwarded(&reading.source_id);
        Ok((reading, channel))
    }
}

pub struct Relay<S, P> {
    source: S,
    forwarder: Forwarder<P>,
}

impl<S, P> Relay<S, P>
where
    S: MessageSource,
    P: Publisher,
{
    pub fn new(source: S, publisher: P, routes: Arc<RoutingTable>, cleaner: Cleaner) -> Self {
        Self {
            source,
            forwarder: Forwarder {
                publisher,
                routes,
                cleaner,
            },
        }
    }

    /// Relay one raw message. Returns the published reading and its channel.
    pub async fn handle_message(
        &self,
        message: &InboundMessage,
    ) -> Result<(Reading, String), RelayError> {
        self.forwarder.forward(message).await
    }
}

#[async_trait]
impl<S, P> Unit for Relay<S, P>
where
    S: MessageSource + 'static,
    P: Publisher + 'static,
{
    const NAME: &'static str = UNIT;

    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), UnitError> {
        tracing::info!(routes = self.forwarder.routes.len(), "Relay running");

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Relay received shutdown signal, exiting loop");
                    return Ok(());
                }
                received = self.source.recv() => received?,
            };

            let Some(message) = received else {
                tracing::info!("Ingest source closed");
                return Ok(());
            };
            metrics::record_received(UNIT);

            match self.forwarder.forward(&message).await {
                Ok(_) => {}
                Err(RelayError::Publish(e)) if e.is_connection() => {
                    tracing::error!(topic = %message.channel, error = %e, "Redistribution connection lost");
                    metrics::record_dropped(UNIT, "publish");
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::warn!(topic = %message.channel, error = %e, "Dropping ingest message");
                    metrics::record_dropped(UNIT, e.reason());
                }
            }
        }
    }
}
