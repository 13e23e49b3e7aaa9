//! Durable reading store.
//!
//! # Responsibilities
//! - Append cleaned readings, one document per reading
//! - Maintain the `(source, capture time)` index
//! - Answer the four KPI queries
//!
//! # Data Flow
//! ```text
//! Collector ──append──▶ ReadingStore ◀──KPI queries── Aggregator / kpi-report
//!                            │
//!                 mongo.rs (MongoStore) | memory.rs (MemoryStore)
//! ```
//!
//! # Design Decisions
//! - Append-only: no updates, no deletes, no uniqueness on `(source, sequence)`
//! - Index creation is idempotent and runs before the first append
//! - KPI queries never mutate the store

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::kpi::{DailyEnergy, Efficiency, KpiFilter, MeanWindSpeed, TotalEnergy};
use crate::model::Reading;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("failed to encode reading: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("unexpected query result: {0}")]
    Decode(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Append and query access to stored readings.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Create the `(source, capture time)` index if it does not exist.
    async fn ensure_index(&self) -> Result<(), StoreError>;

    /// Append one reading.
    async fn append(&self, reading: &Reading) -> Result<(), StoreError>;

    async fn mean_wind_speed(&self, filter: &KpiFilter) -> Result<Vec<MeanWindSpeed>, StoreError>;

    async fn production_efficiency(&self, filter: &KpiFilter)
        -> Result<Vec<Efficiency>, StoreError>;

    async fn daily_energy(
        &self,
        filter: &KpiFilter,
        limit: usize,
    ) -> Result<Vec<DailyEnergy>, StoreError>;

    async fn total_energy(&self, filter: &KpiFilter) -> Result<TotalEnergy, StoreError>;
}

#[async_trait]
impl<T: ReadingStore + ?Sized> ReadingStore for Arc<T> {
    async fn ensure_index(&self) -> Result<(), StoreError> {
        (**self).ensure_index().await
    }

    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        (**self).append(reading).await
    }

    async fn mean_wind_speed(&self, filter: &KpiFilter) -> Result<Vec<MeanWindSpeed>, StoreError> {
        (**self).mean_wind_speed(filter).await
    }

    async fn production_efficiency(
        &self,
        filter: &KpiFilter,
    ) -> Result<Vec<Efficiency>, StoreError> {
        (**self).production_efficiency(filter).await
    }

    async fn daily_energy(
        &self,
        filter: &KpiFilter,
        limit: usize,
    ) -> Result<Vec<DailyEnergy>, StoreError> {
        (**self).daily_energy(filter, limit).await
    }

    async fn total_energy(&self, filter: &KpiFilter) -> Result<TotalEnergy, StoreError> {
        (**self).total_energy(filter).await
    }
}
