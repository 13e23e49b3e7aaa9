//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pipeline.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the telemetry pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// MQTT ingest settings (producer side).
    pub ingest: IngestConfig,

    /// Redis pub/sub settings (relay → collector).
    pub redistribution: RedistributionConfig,

    /// MongoDB settings (collector and aggregator).
    pub store: StoreConfig,

    /// Static routing: `source_id → redistribution channel`.
    pub routes: BTreeMap<String, String>,

    /// Cleaning bounds.
    pub cleaning: CleaningConfig,

    /// Collector settings.
    pub collector: CollectorConfig,

    /// KPI aggregation settings.
    pub aggregator: AggregatorConfig,

    /// Reconnect backoff for failed units.
    pub reconnect: ReconnectConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Startup and shutdown settings.
    pub lifecycle: LifecycleConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let routes = ["T101", "T102", "T103"]
            .into_iter()
            .map(|id| (id.to_string(), format!("turbine:stream:{}", id)))
            .collect();

        Self {
            ingest: IngestConfig::default(),
            redistribution: RedistributionConfig::default(),
            store: StoreConfig::default(),
            routes,
            cleaning: CleaningConfig::default(),
            collector: CollectorConfig::default(),
            aggregator: AggregatorConfig::default(),
            reconnect: ReconnectConfig::default(),
            observability: ObservabilityConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

/// MQTT broker connection and subscriptions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Broker host.
    pub host: String,

    /// Broker port.
    pub port: u16,

    /// Client id prefix; a random suffix is appended per connection.
    pub client_id: String,

    /// Topics carrying raw producer messages.
    pub topics: Vec<String>,

    /// MQTT QoS level for subscriptions (0, 1 or 2).
    pub qos: u8,

    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u64,

    /// Capacity of the client request channel.
    pub channel_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "turbine-relay".to_string(),
            topics: ["T101", "T102", "T103"]
                .iter()
                .map(|id| format!("wind/turbine/data/{}", id))
                .collect(),
            qos: 1,
            keep_alive_secs: 60,
            channel_capacity: 64,
        }
    }
}

/// Redis connection used for pub/sub redistribution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedistributionConfig {
    /// Redis URL (e.g., "redis://localhost:6379").
    pub url: String,
}

impl Default for RedistributionConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
        }
    }
}

/// MongoDB connection and target collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection string.
    pub uri: String,

    /// Database name.
    pub database: String,

    /// Collection holding one document per reading.
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/".to_string(),
            database: "wind_farm".to_string(),
            collection: "turbine_data".to_string(),
        }
    }
}

/// Bounds applied by the cleaner.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Upper bound for `energy_export` in kWh, per source id.
    pub max_energy_export_kwh: BTreeMap<String, f64>,

    /// Upper bound for sources without an entry above.
    pub default_max_energy_export_kwh: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        let max_energy_export_kwh = [("T101", 412.0), ("T102", 472.0), ("T103", 438.0)]
            .into_iter()
            .map(|(id, max)| (id.to_string(), max))
            .collect();

        Self {
            max_energy_export_kwh,
            default_max_energy_export_kwh: 412.0,
        }
    }
}

/// Collector settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Sources whose channels are collected. Empty means every routed source.
    pub sources: Vec<String>,
}

/// Report output format of the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Structured tracing events.
    Log,
    /// One JSON document per report on stdout.
    Json,
}

/// KPI aggregation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Run the aggregator unit.
    pub enabled: bool,

    /// Interval between KPI cycles in seconds.
    pub interval_secs: u64,

    /// Delay before the first cycle in seconds.
    pub initial_delay_secs: u64,

    /// Number of (source, day) groups kept by the daily energy KPI.
    pub daily_limit: usize,

    /// Restrict every KPI to one source.
    pub source_id: Option<String>,

    /// Where reports go.
    pub report_format: ReportFormat,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            initial_delay_secs: 5,
            daily_limit: 10,
            source_id: None,
            report_format: ReportFormat::Log,
        }
    }
}

/// Reconnect configuration for supervised units.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Consecutive failed attempts before a unit gives up (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            max_attempts: 0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Startup and shutdown settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time allowed for units to finish in-flight work after shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 10,
        }
    }
}
