//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the shared routing table and cleaner from configuration
//! - Spawn the relay, collector and aggregator under supervision
//! - On a stop signal, broadcast shutdown and wait for the units to drain
//!
//! # Design Decisions
//! - Units start concurrently and never wait on each other
//! - Each (re)start of a unit opens its own client connections
//! - Units still running after the grace period are abandoned

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::cleaner::Cleaner;
use crate::config::{PipelineConfig, ReportFormat};
use crate::lifecycle::signals::shutdown_signal;
use crate::lifecycle::supervisor::{supervise, Exit};
use crate::lifecycle::Shutdown;
use crate::routing::RoutingTable;
use crate::store::MongoStore;
use crate::transport::{MqttSource, RedisPublisher, RedisSubscriber};
use crate::units::{
    Aggregator, Collector, JsonLinesSink, LogSink, Relay, ReportSink, UnitError,
};

/// Handles of the spawned unit supervisors.
pub struct Units {
    handles: Vec<(&'static str, JoinHandle<Exit>)>,
}

impl Units {
    pub fn from_handles(handles: Vec<(&'static str, JoinHandle<Exit>)>) -> Self {
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every unit to finish, up to `grace`. Returns `false` if the
    /// deadline passed with units still running.
    pub async fn drain(self, grace: Duration) -> bool {
        let wait_all = async {
            for (name, handle) in self.handles {
                match handle.await {
                    Ok(exit) => tracing::info!(unit = name, exit = ?exit, "Unit finished"),
                    Err(e) => tracing::error!(unit = name, error = %e, "Unit task failed"),
                }
            }
        };

        match tokio::time::timeout(grace, wait_all).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(grace_secs = grace.as_secs(), "Shutdown grace period elapsed");
                false
            }
        }
    }
}

/// Spawn every pipeline unit under its own supervisor.
pub fn spawn_units(config: &PipelineConfig, shutdown: &Shutdown) -> Units {
    let routes = Arc::new(RoutingTable::from_config(&config.routes));
    let mut handles = Vec::with_capacity(3);

    let relay = {
        let ingest = config.ingest.clone();
        let redistribution = config.redistribution.clone();
        let reconnect = config.reconnect.clone();
        let routes = routes.clone();
        let cleaner = Cleaner::new(&config.cleaning);
        supervise(shutdown.clone(), config.reconnect.clone(), move || {
            let source = MqttSource::new(&ingest);
            let redistribution = redistribution.clone();
            let reconnect = reconnect.clone();
            let routes = routes.clone();
            let cleaner = cleaner.clone();
            async move {
                let publisher = RedisPublisher::connect(&redistribution, &reconnect).await?;
                Ok::<_, UnitError>(Relay::new(source, publisher, routes, cleaner))
            }
        })
    };
    handles.push(("relay", tokio::spawn(relay)));

    let collector = {
        let redistribution = config.redistribution.clone();
        let reconnect = config.reconnect.clone();
        let store_config = config.store.clone();
        let channels = routes.channels(&config.collector.sources);
        supervise(shutdown.clone(), config.reconnect.clone(), move || {
            let redistribution = redistribution.clone();
            let reconnect = reconnect.clone();
            let store_config = store_config.clone();
            let channels = channels.clone();
            async move {
                let store = MongoStore::connect(&store_config).await?;
                let source =
                    RedisSubscriber::connect(&redistribution, &reconnect, channels).await?;
                Ok::<_, UnitError>(Collector::new(source, store))
            }
        })
    };
    handles.push(("collector", tokio::spawn(collector)));

    if config.aggregator.enabled {
        let aggregator_config = config.aggregator.clone();
        let store_config = config.store.clone();
        let aggregator = supervise(shutdown.clone(), config.reconnect.clone(), move || {
            let aggregator_config = aggregator_config.clone();
            let store_config = store_config.clone();
            async move {
                let store = MongoStore::connect(&store_config).await?;
                let sink: Box<dyn ReportSink> = match aggregator_config.report_format {
                    ReportFormat::Log => Box::new(LogSink),
                    ReportFormat::Json => Box::new(JsonLinesSink::stdout()),
                };
                Ok::<_, UnitError>(Aggregator::new(store, sink, &aggregator_config))
            }
        });
        handles.push(("aggregator", tokio::spawn(aggregator)));
    } else {
        tracing::info!("Aggregator disabled");
    }

    Units::from_handles(handles)
}

/// Run the pipeline until SIGINT/SIGTERM.
pub async fn run(config: PipelineConfig) {
    let shutdown = Shutdown::new();
    let units = spawn_units(&config, &shutdown);
    tracing::info!(units = units.len(), routes = config.routes.len(), "Pipeline started");

    shutdown_signal().await;

    tracing::info!("Shutdown requested, stopping units");
    shutdown.trigger();

    let grace = Duration::from_secs(config.lifecycle.shutdown_grace_secs);
    if units.drain(grace).await {
        tracing::info!("All units stopped");
    }
}
