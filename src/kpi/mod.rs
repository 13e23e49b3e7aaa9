//! KPI definitions.
//!
//! # Data Flow
//! ```text
//! Aggregator tick
//!     → ReadingStore query (one per KPI)
//!         MongoStore: pipelines.rs (aggregation pipeline → result documents → types.rs)
//!         MemoryStore: compute.rs (same formulas over in-memory readings)
//!     → KpiReport → report sink
//! ```
//!
//! # Design Decisions
//! - Queries are read-only; re-running against an unchanged store gives the
//!   same report
//! - Every KPI takes a `KpiFilter` so any of them can be narrowed to one source
//! - Double-precision sums; summation order is not significant

pub mod compute;
pub mod pipelines;
pub mod types;

pub use types::{
    DailyEnergy, Efficiency, Kpi, KpiFilter, KpiReport, MeanWindSpeed, SourceEnergy, TotalEnergy,
};
