//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All units produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - `unit` and `source_id` fields flow through all log events
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
