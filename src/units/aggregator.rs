//! Aggregator: periodic KPI computation.
//!
//! # Responsibilities
//! - Run the four KPIs on a fixed interval after an initial delay
//! - Hand every successful report to the sink
//!
//! # Design Decisions
//! - KPIs fail independently; a failed query is skipped for that cycle
//! - A cycle that has started always completes; shutdown is checked between cycles
//! - Missed ticks are delayed, never bunched

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::AggregatorConfig;
use crate::kpi::{Kpi, KpiFilter, KpiReport};
use crate::observability::metrics;
use crate::store::{ReadingStore, StoreError};
use crate::units::report::ReportSink;
use crate::units::{Unit, UnitError};

/// Run a single KPI query.
pub async fn query_kpi<St>(
    store: &St,
    kpi: Kpi,
    filter: &KpiFilter,
    daily_limit: usize,
) -> Result<KpiReport, StoreError>
where
    St: ReadingStore + ?Sized,
{
    Ok(match kpi {
        Kpi::MeanWindSpeed => KpiReport::MeanWindSpeed(store.mean_wind_speed(filter).await?),
        Kpi::ProductionEfficiency => {
            KpiReport::ProductionEfficiency(store.production_efficiency(filter).await?)
        }
        Kpi::DailyEnergy => KpiReport::DailyEnergy(store.daily_energy(filter, daily_limit).await?),
        Kpi::TotalEnergy => KpiReport::TotalEnergy(store.total_energy(filter).await?),
    })
}

/// Outcome counts of one aggregation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Aggregator<St, K> {
    store: St,
    sink: K,
    filter: KpiFilter,
    daily_limit: usize,
    interval: Duration,
    initial_delay: Duration,
}

impl<St, K> Aggregator<St, K>
where
    St: ReadingStore,
    K: ReportSink,
{
    pub fn new(store: St, sink: K, config: &AggregatorConfig) -> Self {
        Self {
            store,
            sink,
            filter: KpiFilter {
                source_id: config.source_id.clone(),
            },
            daily_limit: config.daily_limit,
            interval: Duration::from_secs(config.interval_secs),
            initial_delay: Duration::from_secs(config.initial_delay_secs),
        }
    }

    /// Run every KPI once and report the successful ones.
    pub async fn run_cycle(&self) -> CycleSummary {
        let mut summary = CycleSummary::default();

        for kpi in Kpi::ALL {
            let started = Instant::now();
            let result = query_kpi(&self.store, kpi, &self.filter, self.daily_limit).await;
            metrics::record_kpi_run(kpi.name(), result.is_ok(), started.elapsed());

            match result {
                Ok(report) => {
                    self.sink.report(&report);
                    summary.succeeded += 1;
                }
                Err(e) => {
                    tracing::error!(kpi = kpi.name(), error = %e, "KPI query failed, skipping");
                    summary.failed += 1;
                }
            }
        }

        tracing::debug!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "KPI cycle complete"
        );
        summary
    }
}

#[async_trait]
impl<St, K> Unit for Aggregator<St, K>
where
    St: ReadingStore + 'static,
    K: ReportSink + 'static,
{
    const NAME: &'static str = "aggregator";

    async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), UnitError> {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            initial_delay_secs = self.initial_delay.as_secs(),
            source_id = ?self.filter.source_id,
            "Aggregator starting"
        );

        tokio::select! {
            biased;
            _ = shutdown.recv() => return Ok(()),
            _ = time::sleep(self.initial_delay) => {}
        }

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Aggregator received shutdown signal, exiting loop");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }
            self.run_cycle().await;
        }
    }
}
