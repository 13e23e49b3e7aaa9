//! Telemetry data model.
//!
//! # Data Flow
//! ```text
//! MQTT payload (bytes)
//!     → wire.rs (IngestMessage: loose, producer-shaped JSON)
//!     → RawSample (source identity resolved)
//!     → cleaner (normalization)
//!     → reading.rs (Reading: typed, invariants hold)
//!     → wire.rs (redistribution / store record encoding)
//! ```
//!
//! # Design Decisions
//! - Absent values are `Option`, never NaN sentinels
//! - The redistribution message and the store record share one encoding
//! - Decoding the ingest format never fails on a bad field, only on bad JSON

pub mod reading;
pub mod wire;

pub use reading::Reading;
pub use wire::{IngestMessage, MessageError, RawData, RawField, RawSample};

/// Wire format of `captured_at` (millisecond resolution, no zone).
pub const CAPTURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
