//! The normalized telemetry sample.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::wire::WireRecord;

/// One cleaned telemetry sample from a single turbine.
///
/// Produced only by the cleaner. After that it is passed by value and never
/// mutated: the relay encodes it, the collector appends it as-is.
///
/// Invariants:
/// - `energy_export` is finite and non-negative.
/// - `wind_speed.is_none()` implies `power.is_none()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireRecord", try_from = "WireRecord")]
pub struct Reading {
    /// Identity of the emitting turbine.
    pub source_id: String,

    /// Per-source producer counter. Monotonic, not gap-free.
    pub sequence: Option<u64>,

    /// Capture time assigned by the producer.
    pub captured_at: Option<NaiveDateTime>,

    /// Wind speed in m/s.
    pub wind_speed: Option<f64>,

    /// Active power in kW. Negative while the turbine consumes.
    pub power: Option<f64>,

    /// Exported energy in kWh.
    pub energy_export: f64,

    /// When the cleaner finished normalizing this sample.
    pub processed_at: DateTime<Utc>,
}

impl Reading {
    /// Calendar day of capture, as stored.
    pub fn capture_date(&self) -> Option<NaiveDate> {
        self.captured_at.map(|ts| ts.date())
    }

    /// `power / wind_speed` when both are present and the wind speed is positive.
    pub fn efficiency(&self) -> Option<f64> {
        match (self.power, self.wind_speed) {
            (Some(power), Some(wind)) if wind > 0.0 => Some(power / wind),
            _ => None,
        }
    }

    /// Encode as a redistribution message.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a redistribution message.
    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}
