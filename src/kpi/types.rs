//! KPI result records.

use chrono::NaiveDate;
use serde::Serialize;

/// Restricts a KPI to one source, or leaves it fleet-wide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KpiFilter {
    pub source_id: Option<String>,
}

impl KpiFilter {
    /// Every source.
    pub fn all() -> Self {
        Self::default()
    }

    /// A single source.
    pub fn source(source_id: impl Into<String>) -> Self {
        Self {
            source_id: Some(source_id.into()),
        }
    }

    pub fn matches(&self, source_id: &str) -> bool {
        self.source_id.as_deref().map_or(true, |id| id == source_id)
    }
}

/// The fixed battery of KPIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kpi {
    MeanWindSpeed,
    ProductionEfficiency,
    DailyEnergy,
    TotalEnergy,
}

impl Kpi {
    pub const ALL: [Kpi; 4] = [
        Kpi::MeanWindSpeed,
        Kpi::ProductionEfficiency,
        Kpi::DailyEnergy,
        Kpi::TotalEnergy,
    ];

    /// Stable name used in logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            Kpi::MeanWindSpeed => "mean_wind_speed",
            Kpi::ProductionEfficiency => "production_efficiency",
            Kpi::DailyEnergy => "daily_energy",
            Kpi::TotalEnergy => "total_energy",
        }
    }
}

/// KPI 1 row: mean wind speed of one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanWindSpeed {
    pub source_id: String,
    /// m/s
    pub avg_wind_speed: f64,
    pub count: u64,
}

/// KPI 2 row: mean `power / wind_speed` of one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Efficiency {
    pub source_id: String,
    /// kW per m/s
    pub avg_efficiency: f64,
    pub count: u64,
}

/// KPI 3 row: energy exported by one source on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEnergy {
    pub source_id: String,
    pub date: NaiveDate,
    /// kWh
    pub total_energy: f64,
}

/// KPI 4 row: energy exported by one source since the beginning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEnergy {
    pub source_id: String,
    /// kWh
    pub total_energy: f64,
}

/// KPI 4: per-source totals plus the fleet total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalEnergy {
    pub per_source: Vec<SourceEnergy>,
    pub grand_total: f64,
}

impl TotalEnergy {
    pub fn from_sources(per_source: Vec<SourceEnergy>) -> Self {
        let grand_total = per_source.iter().map(|s| s.total_energy).sum();
        Self {
            per_source,
            grand_total,
        }
    }
}

/// One KPI's output for one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kpi", content = "results", rename_all = "snake_case")]
pub enum KpiReport {
    MeanWindSpeed(Vec<MeanWindSpeed>),
    ProductionEfficiency(Vec<Efficiency>),
    DailyEnergy(Vec<DailyEnergy>),
    TotalEnergy(TotalEnergy),
}

impl KpiReport {
    pub fn kpi(&self) -> Kpi {
        match self {
            KpiReport::MeanWindSpeed(_) => Kpi::MeanWindSpeed,
            KpiReport::ProductionEfficiency(_) => Kpi::ProductionEfficiency,
            KpiReport::DailyEnergy(_) => Kpi::DailyEnergy,
            KpiReport::TotalEnergy(_) => Kpi::TotalEnergy,
        }
    }

    /// Number of result groups.
    pub fn len(&self) -> usize {
        match self {
            KpiReport::MeanWindSpeed(rows) => rows.len(),
            KpiReport::ProductionEfficiency(rows) => rows.len(),
            KpiReport::DailyEnergy(rows) => rows.len(),
            KpiReport::TotalEnergy(total) => total.per_source.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        assert!(KpiFilter::all().matches("T1"));
        assert!(KpiFilter::source("T1").matches("T1"));
        assert!(!KpiFilter::source("T1").matches("T2"));
    }

    #[test]
    fn test_grand_total() {
        let total = TotalEnergy::from_sources(vec![
            SourceEnergy { source_id: "T1".into(), total_energy: 100.0 },
            SourceEnergy { source_id: "T2".into(), total_energy: 50.0 },
        ]);
        assert_eq!(total.grand_total, 150.0);
        assert_eq!(TotalEnergy::from_sources(Vec::new()).grand_total, 0.0);
    }

    #[test]
    fn test_report_serialization() {
        let report = KpiReport::MeanWindSpeed(vec![MeanWindSpeed {
            source_id: "T1".into(),
            avg_wind_speed: 5.0,
            count: 2,
        }]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["kpi"], "mean_wind_speed");
        assert_eq!(value["results"][0]["count"], 2);

        let daily = KpiReport::DailyEnergy(vec![DailyEnergy {
            source_id: "T1".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            total_energy: 1.0,
        }]);
        let value = serde_json::to_value(&daily).unwrap();
        assert_eq!(value["results"][0]["date"], "2026-10-15");
    }
}
