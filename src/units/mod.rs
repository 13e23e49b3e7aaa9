//! Pipeline processing units.
//!
//! # Data Flow
//! ```text
//! MQTT ──▶ Relay (sanitize → decode → route → clean → publish) ──▶ Redis
//! Redis ──▶ Collector (decode → append) ──▶ store
//! timer ──▶ Aggregator (4 KPI queries) ──▶ ReportSink
//! ```
//!
//! # Design Decisions
//! - Each unit owns its transport handles and runs in its own task
//! - A bad message is logged and skipped; only transport failures end a run
//! - Shutdown is observed before the next input is read, never mid-message

pub mod aggregator;
pub mod collector;
pub mod relay;
pub mod report;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::store::StoreError;
use crate::transport::TransportError;

pub use aggregator::{Aggregator, CycleSummary};
pub use collector::{CollectError, Collector};
pub use relay::{Relay, RelayError};
pub use report::{JsonLinesSink, LogSink, MemorySink, ReportSink};

/// Failure that ends a unit's run and hands control back to its supervisor.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A long-running pipeline unit.
#[async_trait]
pub trait Unit: Send + 'static {
    /// Name used in logs and metric labels.
    const NAME: &'static str;

    /// Process input until shutdown, end of input, or a transport failure.
    async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), UnitError>;
}
