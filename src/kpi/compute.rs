//! KPI formulas over in-memory readings.
//!
//! These are the reference semantics of the four KPIs. The MongoDB pipelines
//! in `pipelines.rs` express the same grouping, filtering and ordering.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::kpi::types::{
    DailyEnergy, Efficiency, KpiFilter, MeanWindSpeed, SourceEnergy, TotalEnergy,
};
use crate::model::Reading;

#[derive(Default)]
struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// KPI 1: mean wind speed per source, ignoring absent wind speeds.
pub fn mean_wind_speed<'a, I>(readings: I, filter: &KpiFilter) -> Vec<MeanWindSpeed>
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut groups: BTreeMap<&str, Mean> = BTreeMap::new();
    for reading in readings {
        if !filter.matches(&reading.source_id) {
            continue;
        }
        if let Some(wind) = reading.wind_speed {
            groups.entry(reading.source_id.as_str()).or_default().add(wind);
        }
    }

    groups
        .into_iter()
        .map(|(source_id, mean)| MeanWindSpeed {
            source_id: source_id.to_string(),
            avg_wind_speed: mean.value(),
            count: mean.count,
        })
        .collect()
}

/// KPI 2: mean `power / wind_speed` per source over readings with a positive
/// wind speed and a present power.
pub fn production_efficiency<'a, I>(readings: I, filter: &KpiFilter) -> Vec<Efficiency>
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut groups: BTreeMap<&str, Mean> = BTreeMap::new();
    for reading in readings {
        if !filter.matches(&reading.source_id) {
            continue;
        }
        if let Some(efficiency) = reading.efficiency() {
            groups
                .entry(reading.source_id.as_str())
                .or_default()
                .add(efficiency);
        }
    }

    groups
        .into_iter()
        .map(|(source_id, mean)| Efficiency {
            source_id: source_id.to_string(),
            avg_efficiency: mean.value(),
            count: mean.count,
        })
        .collect()
}

/// KPI 3: energy per `(source, capture date)`, newest day first, then by
/// source; at most `limit` groups. Readings without a capture time are skipped.
pub fn daily_energy<'a, I>(readings: I, filter: &KpiFilter, limit: usize) -> Vec<DailyEnergy>
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut groups: BTreeMap<(NaiveDate, &str), f64> = BTreeMap::new();
    for reading in readings {
        if !filter.matches(&reading.source_id) {
            continue;
        }
        if let Some(date) = reading.capture_date() {
            *groups.entry((date, reading.source_id.as_str())).or_default() +=
                reading.energy_export;
        }
    }

    let mut rows: Vec<DailyEnergy> = groups
        .into_iter()
        .map(|((date, source_id), total_energy)| DailyEnergy {
            source_id: source_id.to_string(),
            date,
            total_energy,
        })
        .collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.source_id.cmp(&b.source_id)));
    rows.truncate(limit);
    rows
}

/// KPI 4: energy per source over the full history, plus the grand total.
pub fn total_energy<'a, I>(readings: I, filter: &KpiFilter) -> TotalEnergy
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for reading in readings {
        if filter.matches(&reading.source_id) {
            *groups.entry(reading.source_id.as_str()).or_default() += reading.energy_export;
        }
    }

    TotalEnergy::from_sources(
        groups
            .into_iter()
            .map(|(source_id, total_energy)| SourceEnergy {
                source_id: source_id.to_string(),
                total_energy,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, Utc};

    fn at(day: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2026, 10, day).and_then(|d| d.and_hms_opt(12, 0, 0))
    }

    fn reading(source: &str, wind: Option<f64>, power: Option<f64>, energy: f64, day: u32) -> Reading {
        Reading {
            source_id: source.into(),
            sequence: None,
            captured_at: at(day),
            wind_speed: wind,
            power,
            energy_export: energy,
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn test_mean_wind_speed_skips_absent() {
        let readings = vec![
            reading("T1", Some(4.0), None, 0.0, 1),
            reading("T1", Some(6.0), None, 0.0, 1),
            reading("T1", None, None, 0.0, 1),
        ];
        let rows = mean_wind_speed(&readings, &KpiFilter::all());
        assert_eq!(
            rows,
            vec![MeanWindSpeed { source_id: "T1".into(), avg_wind_speed: 5.0, count: 2 }]
        );
    }

    #[test]
    fn test_mean_wind_speed_sorted_and_filtered() {
        let readings = vec![
            reading("T3", Some(3.0), None, 0.0, 1),
            reading("T1", Some(1.0), None, 0.0, 1),
            reading("T2", Some(2.0), None, 0.0, 1),
        ];
        let ids: Vec<_> = mean_wind_speed(&readings, &KpiFilter::all())
            .into_iter()
            .map(|r| r.source_id)
            .collect();
        assert_eq!(ids, vec!["T1", "T2", "T3"]);

        let only = mean_wind_speed(&readings, &KpiFilter::source("T2"));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].avg_wind_speed, 2.0);
    }

    #[test]
    fn test_efficiency() {
        // mean of 10/5 and 20/4
        let readings = vec![
            reading("T1", Some(5.0), Some(10.0), 0.0, 1),
            reading("T1", Some(4.0), Some(20.0), 0.0, 1),
            reading("T1", Some(0.0), Some(30.0), 0.0, 1),
            reading("T1", Some(3.0), None, 0.0, 1),
            reading("T1", None, None, 0.0, 1),
        ];
        let rows = production_efficiency(&readings, &KpiFilter::all());
        assert_eq!(
            rows,
            vec![Efficiency { source_id: "T1".into(), avg_efficiency: 3.5, count: 2 }]
        );
    }

    #[test]
    fn test_daily_energy_order_and_limit() {
        let mut readings = Vec::new();
        for day in 1..=6 {
            readings.push(reading("T2", None, None, 1.0, day));
            readings.push(reading("T1", None, None, 2.0, day));
            readings.push(reading("T1", None, None, 0.5, day));
        }
        let mut undated = reading("T1", None, None, 99.0, 1);
        undated.captured_at = None;
        readings.push(undated);

        let rows = daily_energy(&readings, &KpiFilter::all(), 10);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2026, 10, 6).unwrap());
        assert_eq!(rows[0].source_id, "T1");
        assert_eq!(rows[0].total_energy, 2.5);
        assert_eq!(rows[1].source_id, "T2");
        assert_eq!(rows[1].total_energy, 1.0);
        assert_eq!(rows[9].date, NaiveDate::from_ymd_opt(2026, 10, 2).unwrap());
        assert!(rows.iter().all(|r| r.total_energy < 99.0));
    }

    #[test]
    fn test_total_energy() {
        let readings = vec![
            reading("T1", None, None, 60.0, 1),
            reading("T2", None, None, 50.0, 1),
            reading("T1", None, None, 40.0, 2),
        ];
        let total = total_energy(&readings, &KpiFilter::all());
        assert_eq!(total.per_source.len(), 2);
        assert_eq!(total.per_source[0].total_energy, 100.0);
        assert_eq!(total.per_source[1].total_energy, 50.0);
        assert_eq!(total.grand_total, 150.0);

        let t2 = total_energy(&readings, &KpiFilter::source("T2"));
        assert_eq!(t2.grand_total, 50.0);
    }

    #[test]
    fn test_empty_input() {
        let readings: Vec<Reading> = Vec::new();
        assert!(mean_wind_speed(&readings, &KpiFilter::all()).is_empty());
        assert!(production_efficiency(&readings, &KpiFilter::all()).is_empty());
        assert!(daily_energy(&readings, &KpiFilter::all(), 10).is_empty());
        let total = total_energy(&readings, &KpiFilter::all());
        assert!(total.per_source.is_empty());
        assert_eq!(total.grand_total, 0.0);
    }
}
