//! Collector: Redis redistribution to the store.
//!
//! # Responsibilities
//! - Ensure the store index before the first append
//! - Decode each redistribution message and append it unchanged
//!
//! # Design Decisions
//! - Store write failures drop the reading; there is no retry queue
//! - Redelivered messages are appended again (no deduplication)

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::model::Reading;
use crate::observability::metrics;
use crate::store::{ReadingStore, StoreError};
use crate::transport::{InboundMessage, MessageSource};
use crate::units::{Unit, UnitError};

const UNIT: &str = "collector";

/// Why a message was not stored.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("malformed redistribution message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("append failed: {0}")]
    Append(#[from] StoreError),
}

impl CollectError {
    pub fn reason(&self) -> &'static str {
        match self {
            CollectError::Decode(_) => "malformed",
            CollectError::Append(_) => "store_write",
        }
    }
}

/// Append one redistribution message to `store`.
pub async fn collect<St>(store: &St, message: &InboundMessage) -> Result<Reading, CollectError>
where
    St: ReadingStore + ?Sized,
{
    let reading = Reading::from_json(&message.payload)?;
    store.append(&reading).await?;
    metrics::record_persisted(&reading.source_id);
    Ok(reading)
}

pub struct Collector<S, St> {
    source: S,
    store: St,
}

impl<S, St> Collector<S, St>
where
    S: MessageSource,
    St: ReadingStore,
{
    pub fn new(source: S, store: St) -> Self {
        Self { source, store }
    }
}

#[async_trait]
impl<S, St> Unit for Collector<S, St>
where
    S: MessageSource + 'static,
    St: ReadingStore + 'static,
{
    const NAME: &'static str = UNIT;

    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), UnitError> {
        self.store.ensure_index().await?;
        tracing::info!("Collector running");

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Collector received shutdown signal, exiting loop");
                    return Ok(());
                }
                received = self.source.recv() => received?,
            };

            let Some(message) = received else {
                tracing::info!("Redistribution source closed");
                return Ok(());
            };
            metrics::record_received(UNIT);

            match collect(&self.store, &message).await {
                Ok(reading) => tracing::trace!(
                    source_id = %reading.source_id,
                    channel = %message.channel,
                    "Reading stored"
                ),
                Err(e) => {
                    tracing::warn!(channel = %message.channel, error = %e, "Dropping redistribution message");
                    metrics::record_dropped(UNIT, e.reason());
                }
            }
        }
    }
}
