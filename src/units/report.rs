//! KPI report sinks.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::kpi::KpiReport;

/// Destination for KPI reports.
pub trait ReportSink: Send + Sync {
    fn report(&self, report: &KpiReport);
}

impl<T: ReportSink + ?Sized> ReportSink for Box<T> {
    fn report(&self, report: &KpiReport) {
        (**self).report(report)
    }
}

impl<T: ReportSink + ?Sized> ReportSink for Arc<T> {
    fn report(&self, report: &KpiReport) {
        (**self).report(report)
    }
}

/// Emits one tracing event per result row, then a summary event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn report(&self, report: &KpiReport) {
        let kpi = report.kpi().name();
        match report {
            KpiReport::MeanWindSpeed(rows) => {
                for row in rows {
                    tracing::info!(
                        kpi,
                        source_id = %row.source_id,
                        avg_wind_speed = row.avg_wind_speed,
                        count = row.count,
                        "KPI result"
                    );
                }
            }
            KpiReport::ProductionEfficiency(rows) => {
                for row in rows {
                    tracing::info!(
                        kpi,
                        source_id = %row.source_id,
                        avg_efficiency = row.avg_efficiency,
                        count = row.count,
                        "KPI result"
                    );
                }
            }
            KpiReport::DailyEnergy(rows) => {
                for row in rows {
                    tracing::info!(
                        kpi,
                        source_id = %row.source_id,
                        date = %row.date,
                        total_energy = row.total_energy,
                        "KPI result"
                    );
                }
            }
            KpiReport::TotalEnergy(total) => {
                for row in &total.per_source {
                    tracing::info!(
                        kpi,
                        source_id = %row.source_id,
                        total_energy = row.total_energy,
                        "KPI result"
                    );
                }
                tracing::info!(kpi, grand_total = total.grand_total, "KPI grand total");
            }
        }
        tracing::info!(kpi, groups = report.len(), "KPI report complete");
    }
}

/// Writes each report as one JSON line.
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> ReportSink for JsonLinesSink<W> {
    fn report(&self, report: &KpiReport) {
        let line = match serde_json::to_string(report) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(kpi = report.kpi().name(), error = %e, "Failed to encode KPI report");
                return;
            }
        };

        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            tracing::error!(kpi = report.kpi().name(), error = %e, "Failed to write KPI report");
        }
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<KpiReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<KpiReport> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ReportSink for MemorySink {
    fn report(&self, report: &KpiReport) {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(report.clone());
    }
}
