//! Shared utilities for integration testing.
//!
//! Wires the relay and collector together over in-memory transports so the
//! full ingest → redistribution → store path runs without any broker.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use turbine_relay::cleaner::Cleaner;
use turbine_relay::config::CleaningConfig;
use turbine_relay::routing::RoutingTable;
use turbine_relay::store::MemoryStore;
use turbine_relay::transport::memory::{self, MemoryPublisher};
use turbine_relay::units::{Collector, Relay, Unit, UnitError};

pub const INGEST_TOPIC: &str = "wind/turbine/data";

/// Default routes of the reference deployment.
pub fn routes() -> Arc<RoutingTable> {
    Arc::new(RoutingTable::new([
        ("T101", "turbine:stream:T101"),
        ("T102", "turbine:stream:T102"),
        ("T103", "turbine:stream:T103"),
    ]))
}

/// Build an ingest payload. `None` fields are sent as JSON `null`.
pub fn ingest_payload(
    source_id: &str,
    row: u64,
    timestamp: Option<&str>,
    wind_speed: Option<f64>,
    power: Option<f64>,
    energy: Option<f64>,
) -> String {
    json!({
        "turbine_id": source_id,
        "row": row,
        "data": {
            "timestamp": timestamp,
            "wind_speed_ms": wind_speed,
            "power_kw": power,
            "energy_export_kwh": energy,
        }
    })
    .to_string()
}

/// Same as `ingest_payload` with raw JSON field text, for tokens such as `NaN`.
pub fn raw_payload(source_id: &str, row: u64, data: &str) -> String {
    format!(r#"{{"turbine_id":"{}","row":{},"data":{}}}"#, source_id, row, data)
}

pub fn parse(payload: &str) -> Value {
    serde_json::from_str(payload).unwrap()
}

/// Relay and collector running against an in-memory store.
pub struct Pipeline {
    pub ingest: MemoryPublisher,
    pub store: Arc<MemoryStore>,
    shutdown: broadcast::Sender<()>,
    relay: JoinHandle<Result<(), UnitError>>,
    collector: JoinHandle<Result<(), UnitError>>,
}

impl Pipeline {
    pub fn start() -> Self {
        Self::start_with_store(Arc::new(MemoryStore::new()))
    }

    pub fn start_with_store(store: Arc<MemoryStore>) -> Self {
        let routes = routes();
        let (shutdown, _) = broadcast::channel(1);

        let (ingest, ingest_source) = memory::channel(64);
        let (redis, redis_source) = memory::channel(64);
        let redis_source = redis_source.subscribe(routes.channels(&[]));

        let relay = Relay::new(
            ingest_source,
            redis,
            routes,
            Cleaner::new(&CleaningConfig::default()),
        );
        let collector = Collector::new(redis_source, store.clone());

        Self {
            ingest,
            store,
            relay: tokio::spawn(relay.run(shutdown.subscribe())),
            collector: tokio::spawn(collector.run(shutdown.subscribe())),
            shutdown,
        }
    }

    pub async fn send(&self, payload: impl Into<Vec<u8>>) {
        self.ingest.send(INGEST_TOPIC, payload).await.unwrap();
    }

    /// Close the ingest side and wait until everything sent has been stored.
    pub async fn drain(self) -> Arc<MemoryStore> {
        drop(self.ingest);
        self.relay.await.unwrap().unwrap();
        self.collector.await.unwrap().unwrap();
        drop(self.shutdown);
        self.store
    }

    /// Stop both units through the shutdown broadcast.
    pub async fn shutdown(self) -> Arc<MemoryStore> {
        let _ = self.shutdown.send(());
        self.relay.await.unwrap().unwrap();
        self.collector.await.unwrap().unwrap();
        self.store
    }
}
