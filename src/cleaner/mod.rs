//! Sample cleaning and normalization.
//!
//! # Responsibilities
//! - Turn a `RawSample` into a `Reading`, never failing
//! - Normalize NaN, non-finite and non-numeric field values to absent
//! - Enforce the wind/power coupling and the per-source energy export bound
//! - Stamp `processed_at`
//!
//! # Design Decisions
//! - A sample with every field absent is still emitted (gaps stay visible)
//! - Absence is decided here once; nothing downstream re-checks for NaN
//! - Present non-positive power forces zero export; absent power keeps the
//!   producer's export value
//! - A non-integral or negative `row` becomes an absent sequence

pub mod sanitize;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::config::CleaningConfig;
use crate::model::wire::parse_captured_at;
use crate::model::{RawField, RawSample, Reading};
use crate::observability::metrics;

/// Normalizes raw samples into readings.
#[derive(Debug, Clone)]
pub struct Cleaner {
    max_energy_export: BTreeMap<String, f64>,
    default_max_energy_export: f64,
}

impl Cleaner {
    /// Create a cleaner with the given energy export bounds.
    ///
    /// Bounds are expected to be validated. A NaN bound is treated as
    /// unbounded and a negative one as zero.
    pub fn new(config: &CleaningConfig) -> Self {
        Self {
            max_energy_export: config
                .max_energy_export_kwh
                .iter()
                .map(|(source, max)| (source.clone(), energy_bound(source, *max)))
                .collect(),
            default_max_energy_export: energy_bound("default", config.default_max_energy_export_kwh),
        }
    }

    /// Energy export bound applied to `source_id`.
    pub fn max_energy_export(&self, source_id: &str) -> f64 {
        self.max_energy_export
            .get(source_id)
            .copied()
            .unwrap_or(self.default_max_energy_export)
    }

    /// Clean a sample, stamping it with the current time.
    pub fn clean(&self, raw: RawSample) -> Reading {
        self.clean_at(raw, Utc::now())
    }

    /// Clean a sample with an explicit processing timestamp.
    pub fn clean_at(&self, raw: RawSample, processed_at: DateTime<Utc>) -> Reading {
        let data = raw.data;

        let captured_at = match data.timestamp {
            Some(RawField::Text(ref text)) => {
                let parsed = parse_captured_at(text);
                if parsed.is_none() {
                    metrics::record_field_correction("timestamp");
                }
                parsed
            }
            Some(_) => {
                metrics::record_field_correction("timestamp");
                None
            }
            None => None,
        };

        let wind_speed = numeric("wind_speed_ms", data.wind_speed_ms.as_ref()).filter(|v| {
            let valid = *v >= 0.0;
            if !valid {
                metrics::record_field_correction("wind_speed_ms");
            }
            valid
        });

        let mut power = numeric("power_kw", data.power_kw.as_ref());
        if wind_speed.is_none() && power.is_some() {
            tracing::debug!(source_id = %raw.source_id, "Power reported without wind speed, dropping power");
            metrics::record_field_correction("power_kw");
            power = None;
        }

        let reported_energy = numeric("energy_export_kwh", data.energy_export_kwh.as_ref());
        let energy_export = match power {
            Some(p) if p <= 0.0 => 0.0,
            _ => reported_energy
                .unwrap_or(0.0)
                .clamp(0.0, self.max_energy_export(&raw.source_id)),
        };

        Reading {
            sequence: sequence(raw.row.as_ref()),
            source_id: raw.source_id,
            captured_at,
            wind_speed,
            power,
            energy_export,
            processed_at,
        }
    }
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(&CleaningConfig::default())
    }
}

fn energy_bound(source: &str, max: f64) -> f64 {
    if max.is_nan() {
        tracing::warn!(source_id = %source, "NaN energy export bound, export is unbounded");
        f64::INFINITY
    } else if max < 0.0 {
        tracing::warn!(source_id = %source, max, "Negative energy export bound, export is forced to zero");
        0.0
    } else {
        max
    }
}

/// Interpret a raw `row` as a sequence number.
fn sequence(value: Option<&RawField>) -> Option<u64> {
    let value = value?;
    let parsed = match value {
        RawField::Number(n) => integral(*n),
        RawField::Text(text) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral))
        }
        RawField::Other(_) => None,
    };

    if parsed.is_none() {
        metrics::record_field_correction("row");
    }
    parsed
}

fn integral(n: f64) -> Option<u64> {
    (n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64).then(|| n as u64)
}

/// Interpret a raw field as a finite number.
///
/// Text is accepted when it parses as a finite number; `"nan"` in any case,
/// infinities and anything else become absent.
fn numeric(field: &'static str, value: Option<&RawField>) -> Option<f64> {
    let value = value?;
    let parsed = match value {
        RawField::Number(n) => Some(*n),
        RawField::Text(text) => text.trim().parse::<f64>().ok(),
        RawField::Other(_) => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Some(n),
        _ => {
            metrics::record_field_correction(field);
            None
        }
    }
}
