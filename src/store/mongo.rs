//! MongoDB-backed store.

use async_trait::async_trait;
use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::{Client, Collection, IndexModel};

use crate::config::StoreConfig;
use crate::kpi::{pipelines, DailyEnergy, Efficiency, KpiFilter, MeanWindSpeed, TotalEnergy};
use crate::model::Reading;
use crate::store::{ReadingStore, StoreError};

/// Readings collection in a MongoDB database.
#[derive(Clone)]
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect and bind to the configured collection.
    ///
    /// The driver connects lazily; server errors surface on the first operation.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.uri).await?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "MongoDB store ready"
        );

        Ok(Self { collection })
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection.aggregate(pipeline).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl ReadingStore for MongoStore {
    async fn ensure_index(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "turbine_id": 1, "data.timestamp": 1 })
            .build();
        let created = self.collection.create_index(index).await?;
        tracing::debug!(index = %created.index_name, "Store index ensured");
        Ok(())
    }

    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        let document = bson::to_document(reading)?;
        self.collection.insert_one(document).await?;
        Ok(())
    }

    async fn mean_wind_speed(&self, filter: &KpiFilter) -> Result<Vec<MeanWindSpeed>, StoreError> {
        let docs = self.aggregate(pipelines::mean_wind_speed(filter)).await?;
        pipelines::decode_mean_wind_speed(&docs)
    }

    async fn production_efficiency(
        &self,
        filter: &KpiFilter,
    ) -> Result<Vec<Efficiency>, StoreError> {
        let docs = self.aggregate(pipelines::production_efficiency(filter)).await?;
        pipelines::decode_production_efficiency(&docs)
    }

    async fn daily_energy(
        &self,
        filter: &KpiFilter,
        limit: usize,
    ) -> Result<Vec<DailyEnergy>, StoreError> {
        let docs = self.aggregate(pipelines::daily_energy(filter, limit)).await?;
        pipelines::decode_daily_energy(&docs)
    }

    async fn total_energy(&self, filter: &KpiFilter) -> Result<TotalEnergy, StoreError> {
        let docs = self.aggregate(pipelines::total_energy(filter)).await?;
        pipelines::decode_total_energy(&docs)
    }
}
