//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define pipeline metrics (throughput, drops, KPI runs)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `pipeline_messages_received_total` (counter): inbound messages by unit
//! - `pipeline_messages_dropped_total` (counter): dropped messages by unit, reason
//! - `pipeline_readings_forwarded_total` (counter): relay publishes by source
//! - `pipeline_readings_persisted_total` (counter): store appends by source
//! - `pipeline_field_corrections_total` (counter): fields normalized to absent
//! - `pipeline_kpi_runs_total` (counter): KPI executions by kpi, outcome
//! - `pipeline_kpi_duration_seconds` (histogram): KPI query latency
//! - `pipeline_unit_restarts_total` (counter): supervisor restarts by unit
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, CLI)
//! - Labels stay low-cardinality: unit, reason, kpi, source

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_received(unit: &'static str) {
    counter!("pipeline_messages_received_total", "unit" => unit).increment(1);
}

pub fn record_dropped(unit: &'static str, reason: &'static str) {
    counter!("pipeline_messages_dropped_total", "unit" => unit, "reason" => reason).increment(1);
}

pub fn record_forwarded(source_id: &str) {
    counter!("pipeline_readings_forwarded_total", "source" => source_id.to_string()).increment(1);
}

pub fn record_persisted(source_id: &str) {
    counter!("pipeline_readings_persisted_total", "source" => source_id.to_string()).increment(1);
}

pub fn record_field_correction(field: &'static str) {
    counter!("pipeline_field_corrections_total", "field" => field).increment(1);
}

pub fn record_kpi_run(kpi: &'static str, success: bool, elapsed: Duration) {
    let outcome = if success { "ok" } else { "error" };
    counter!("pipeline_kpi_runs_total", "kpi" => kpi, "outcome" => outcome).increment(1);
    histogram!("pipeline_kpi_duration_seconds", "kpi" => kpi).record(elapsed.as_secs_f64());
}

pub fn record_unit_restart(unit: &'static str) {
    counter!("pipeline_unit_restarts_total", "unit" => unit).increment(1);
}
