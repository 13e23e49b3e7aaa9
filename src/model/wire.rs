//! Wire formats: the producer's ingest message and the relay's record encoding.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::reading::Reading;
use crate::model::CAPTURED_AT_FORMAT;

/// Errors decoding an inbound payload.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Payload is not UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Payload is not JSON of the expected shape.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload carries no usable `turbine_id`.
    #[error("message has no turbine_id")]
    MissingSourceId,
}

/// One field value as the producer sent it.
///
/// Producers send numbers, `null`, and sometimes text such as `"NaN"`.
/// Interpretation is left to the cleaner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// The `data` object of an ingest message. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawData {
    #[serde(default)]
    pub timestamp: Option<RawField>,
    #[serde(default)]
    pub wind_speed_ms: Option<RawField>,
    #[serde(default)]
    pub energy_export_kwh: Option<RawField>,
    #[serde(default)]
    pub power_kw: Option<RawField>,
}

/// Ingest message as published by a turbine simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestMessage {
    #[serde(default)]
    pub turbine_id: Option<String>,
    #[serde(default)]
    pub row: Option<RawField>,
    #[serde(default)]
    pub data: RawData,
}

impl IngestMessage {
    /// Decode a JSON payload that has already been made valid JSON.
    pub fn from_json(payload: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Resolve the source identity, consuming the message.
    pub fn into_sample(self) -> Result<RawSample, MessageError> {
        let source_id = self
            .turbine_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(MessageError::MissingSourceId)?;

        Ok(RawSample {
            source_id,
            row: self.row,
            data: self.data,
        })
    }
}

/// An ingest message whose source identity is known.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub source_id: String,
    pub row: Option<RawField>,
    pub data: RawData,
}

/// Parse a producer timestamp. Accepts the space- or `T`-separated form.
pub fn parse_captured_at(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Encoded form of a [`Reading`], shared by Redis messages and store documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRecord {
    turbine_id: String,
    #[serde(default)]
    row: Option<u64>,
    data: WireData,
    processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireData {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    wind_speed_ms: Option<f64>,
    energy_export_kwh: f64,
    #[serde(default)]
    power_kw: Option<f64>,
}

impl From<Reading> for WireRecord {
    fn from(reading: Reading) -> Self {
        Self {
            turbine_id: reading.source_id,
            row: reading.sequence,
            data: WireData {
                timestamp: reading
                    .captured_at
                    .map(|ts| ts.format(CAPTURED_AT_FORMAT).to_string()),
                wind_speed_ms: reading.wind_speed,
                energy_export_kwh: reading.energy_export,
                power_kw: reading.power,
            },
            processed_at: reading.processed_at,
        }
    }
}

impl TryFrom<WireRecord> for Reading {
    type Error = String;

    fn try_from(record: WireRecord) -> Result<Self, Self::Error> {
        let captured_at = match record.data.timestamp {
            Some(text) => Some(
                parse_captured_at(&text).ok_or_else(|| format!("invalid timestamp '{}'", text))?,
            ),
            None => None,
        };

        Ok(Reading {
            source_id: record.turbine_id,
            sequence: record.row,
            captured_at,
            wind_speed: record.data.wind_speed_ms,
            power: record.data.power_kw,
            energy_export: record.data.energy_export_kwh,
            processed_at: record.processed_at,
        })
    }
}
