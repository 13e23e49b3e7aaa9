//! MongoDB aggregation pipelines for the four KPIs, and decoding of their
//! result documents.
//!
//! Store documents have the redistribution message layout:
//! `{ turbine_id, row, data: { timestamp, wind_speed_ms, energy_export_kwh, power_kw }, processed_at }`.

use bson::{doc, Bson, Document};
use chrono::NaiveDate;

use crate::kpi::types::{
    DailyEnergy, Efficiency, KpiFilter, MeanWindSpeed, SourceEnergy, TotalEnergy,
};
use crate::store::StoreError;

fn with_source_filter(filter: &KpiFilter, stages: Vec<Document>) -> Vec<Document> {
    let mut pipeline = Vec::with_capacity(stages.len() + 1);
    if let Some(source_id) = &filter.source_id {
        pipeline.push(doc! { "$match": { "turbine_id": source_id.as_str() } });
    }
    pipeline.extend(stages);
    pipeline
}

/// KPI 1 pipeline.
pub fn mean_wind_speed(filter: &KpiFilter) -> Vec<Document> {
    with_source_filter(
        filter,
        vec![
            doc! { "$match": { "data.wind_speed_ms": { "$ne": null } } },
            doc! {
                "$group": {
                    "_id": "$turbine_id",
                    "avg_wind_speed": { "$avg": "$data.wind_speed_ms" },
                    "count": { "$sum": 1 },
                }
            },
            doc! { "$sort": { "_id": 1 } },
        ],
    )
}

/// KPI 2 pipeline.
pub fn production_efficiency(filter: &KpiFilter) -> Vec<Document> {
    with_source_filter(
        filter,
        vec![
            doc! {
                "$match": {
                    "data.wind_speed_ms": { "$ne": null, "$gt": 0 },
                    "data.power_kw": { "$ne": null },
                }
            },
            doc! {
                "$addFields": {
                    "efficiency": { "$divide": ["$data.power_kw", "$data.wind_speed_ms"] }
                }
            },
            doc! {
                "$group": {
                    "_id": "$turbine_id",
                    "avg_efficiency": { "$avg": "$efficiency" },
                    "count": { "$sum": 1 },
                }
            },
            doc! { "$sort": { "_id": 1 } },
        ],
    )
}

/// KPI 3 pipeline. The date is the first ten bytes of the stored timestamp.
pub fn daily_energy(filter: &KpiFilter, limit: usize) -> Vec<Document> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    with_source_filter(
        filter,
        vec![
            doc! { "$match": { "data.timestamp": { "$type": "string" } } },
            doc! {
                "$addFields": {
                    "date": { "$substrBytes": ["$data.timestamp", 0, 10] }
                }
            },
            doc! {
                "$group": {
                    "_id": { "turbine": "$turbine_id", "date": "$date" },
                    "total_energy": { "$sum": "$data.energy_export_kwh" },
                }
            },
            doc! { "$sort": { "_id.date": -1, "_id.turbine": 1 } },
            doc! { "$limit": limit },
        ],
    )
}

/// KPI 4 pipeline (per-source part; the grand total is summed client-side).
pub fn total_energy(filter: &KpiFilter) -> Vec<Document> {
    with_source_filter(
        filter,
        vec![
            doc! {
                "$group": {
                    "_id": "$turbine_id",
                    "total_energy": { "$sum": "$data.energy_export_kwh" },
                }
            },
            doc! { "$sort": { "_id": 1 } },
        ],
    )
}

fn decode_error(key: &str, doc: &Document) -> StoreError {
    StoreError::Decode(format!("field '{}' missing or mistyped in {}", key, doc))
}

fn number(doc: &Document, key: &str) -> Result<f64, StoreError> {
    match doc.get(key) {
        Some(Bson::Double(v)) => Ok(*v),
        Some(Bson::Int32(v)) => Ok(f64::from(*v)),
        Some(Bson::Int64(v)) => Ok(*v as f64),
        _ => Err(decode_error(key, doc)),
    }
}

fn count(doc: &Document, key: &str) -> Result<u64, StoreError> {
    match doc.get(key) {
        Some(Bson::Int32(v)) if *v >= 0 => Ok(*v as u64),
        Some(Bson::Int64(v)) if *v >= 0 => Ok(*v as u64),
        _ => Err(decode_error(key, doc)),
    }
}

fn text<'a>(doc: &'a Document, key: &str) -> Result<&'a str, StoreError> {
    doc.get_str(key).map_err(|_| decode_error(key, doc))
}

pub fn decode_mean_wind_speed(docs: &[Document]) -> Result<Vec<MeanWindSpeed>, StoreError> {
    docs.iter()
        .map(|doc| {
            Ok(MeanWindSpeed {
                source_id: text(doc, "_id")?.to_string(),
                avg_wind_speed: number(doc, "avg_wind_speed")?,
                count: count(doc, "count")?,
            })
        })
        .collect()
}

pub fn decode_production_efficiency(docs: &[Document]) -> Result<Vec<Efficiency>, StoreError> {
    docs.iter()
        .map(|doc| {
            Ok(Efficiency {
                source_id: text(doc, "_id")?.to_string(),
                avg_efficiency: number(doc, "avg_efficiency")?,
                count: count(doc, "count")?,
            })
        })
        .collect()
}

pub fn decode_daily_energy(docs: &[Document]) -> Result<Vec<DailyEnergy>, StoreError> {
    docs.iter()
        .map(|doc| {
            let id = doc.get_document("_id").map_err(|_| decode_error("_id", doc))?;
            let date_text = text(id, "date")?;
            let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").map_err(|e| {
                StoreError::Decode(format!("invalid date '{}': {}", date_text, e))
            })?;
            Ok(DailyEnergy {
                source_id: text(id, "turbine")?.to_string(),
                date,
                total_energy: number(doc, "total_energy")?,
            })
        })
        .collect()
}

pub fn decode_total_energy(docs: &[Document]) -> Result<TotalEnergy, StoreError> {
    let per_source = docs
        .iter()
        .map(|doc| {
            Ok(SourceEnergy {
                source_id: text(doc, "_id")?.to_string(),
                total_energy: number(doc, "total_energy")?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    Ok(TotalEnergy::from_sources(per_source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_filter_is_first_stage() {
        let pipeline = mean_wind_speed(&KpiFilter::source("T101"));
        assert_eq!(pipeline.len(), 4);
        assert_eq!(pipeline[0], doc! { "$match": { "turbine_id": "T101" } });

        assert_eq!(mean_wind_speed(&KpiFilter::all()).len(), 3);
        assert_eq!(total_energy(&KpiFilter::all()).len(), 2);
    }

    #[test]
    fn test_daily_pipeline_sort_and_limit() {
        let pipeline = daily_energy(&KpiFilter::all(), 10);
        let sort = pipeline[3].get_document("$sort").unwrap();
        let keys: Vec<_> = sort.keys().cloned().collect();
        assert_eq!(keys, vec!["_id.date", "_id.turbine"]);
        assert_eq!(sort.get_i32("_id.date").unwrap(), -1);
        assert_eq!(pipeline[4], doc! { "$limit": 10_i64 });
    }

    #[test]
    fn test_efficiency_pipeline_excludes_non_positive_wind() {
        let pipeline = production_efficiency(&KpiFilter::all());
        let matched = pipeline[0].get_document("$match").unwrap();
        let wind = matched.get_document("data.wind_speed_ms").unwrap();
        assert_eq!(wind.get_i32("$gt").unwrap(), 0);
    }

    #[test]
    fn test_decode_results() {
        let wind = decode_mean_wind_speed(&[
            doc! { "_id": "T1", "avg_wind_speed": 5.0, "count": 2 },
            doc! { "_id": "T2", "avg_wind_speed": 4_i32, "count": 7_i64 },
        ])
        .unwrap();
        assert_eq!(wind[0].count, 2);
        assert_eq!(wind[1].avg_wind_speed, 4.0);

        let daily = decode_daily_energy(&[doc! {
            "_id": { "turbine": "T1", "date": "2026-10-15" },
            "total_energy": 12.5,
        }])
        .unwrap();
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());

        let total = decode_total_energy(&[
            doc! { "_id": "T1", "total_energy": 100.0 },
            doc! { "_id": "T2", "total_energy": 50.0 },
        ])
        .unwrap();
        assert_eq!(total.grand_total, 150.0);
    }

    #[test]
    fn test_decode_rejects_unexpected_shapes() {
        assert!(decode_mean_wind_speed(&[doc! { "_id": null, "avg_wind_speed": 1.0, "count": 1 }]).is_err());
        assert!(decode_total_energy(&[doc! { "_id": "T1", "total_energy": "lots" }]).is_err());
        assert!(decode_daily_energy(&[doc! { "_id": { "turbine": "T1", "date": "" }, "total_energy": 1.0 }]).is_err());
    }
}
