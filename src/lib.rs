//! Wind turbine telemetry pipeline library.

pub mod cleaner;
pub mod config;
pub mod kpi;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod store;
pub mod transport;
pub mod units;

pub use config::schema::PipelineConfig;
pub use lifecycle::Shutdown;
pub use model::Reading;
