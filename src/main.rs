//! Wind turbine telemetry pipeline (v1)
//!
//! Moves turbine telemetry from an MQTT broker through Redis pub/sub into
//! MongoDB and periodically reports KPIs over the stored history.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────────┐
//!                 │                        TURBINE RELAY                          │
//!                 │                                                               │
//!  MQTT broker    │  ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌──────────┐      │
//!  ───────────────┼─▶│  mqtt   │──▶│ cleaner │──▶│ routing │──▶│  redis   │──────┼──▶ Redis
//!  wind/turbine/..│  │ source  │   │         │   │  table  │   │publisher │      │   pub/sub
//!                 │  └─────────┘   └─────────┘   └─────────┘   └──────────┘      │      │
//!                 │                     Relay                                     │      │
//!                 │                                                               │      │
//!                 │  ┌──────────┐   ┌─────────────┐                               │      │
//!  MongoDB   ◀────┼──│  store   │◀──│    redis    │◀──────────────────────────────┼──────┘
//!  turbine_data   │  │  append  │   │ subscriber  │   Collector                   │
//!       │         │  └──────────┘   └─────────────┘                               │
//!       │         │                                                               │
//!       │         │  ┌──────────┐   ┌─────────────┐                               │
//!       └─────────┼─▶│ 4 KPI    │──▶│ report sink │   Aggregator (timer)          │
//!                 │  │ queries  │   │ log / json  │                               │
//!                 │  └──────────┘   └─────────────┘                               │
//!                 │                                                               │
//!                 │  Cross-cutting: config · lifecycle/supervisor · observability │
//!                 └──────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use turbine_relay::config::load_or_default;
use turbine_relay::lifecycle;
use turbine_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "turbine-relay")]
#[command(about = "Wind turbine telemetry pipeline: MQTT → Redis → MongoDB, with periodic KPIs", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    logging::init(&config.observability)?;

    tracing::info!("turbine-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        broker = %format!("{}:{}", config.ingest.host, config.ingest.port),
        topics = config.ingest.topics.len(),
        redis = %config.redistribution.url,
        database = %config.store.database,
        collection = %config.store.collection,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    lifecycle::run(config).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
