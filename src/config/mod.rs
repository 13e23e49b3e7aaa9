//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PipelineConfig (validated, immutable)
//!     → each unit receives the sections it needs at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the routing table is static for the
//!   lifetime of the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AggregatorConfig, CleaningConfig, CollectorConfig, IngestConfig, LifecycleConfig, LogFormat,
    ObservabilityConfig, PipelineConfig, ReconnectConfig, RedistributionConfig, ReportFormat,
    StoreConfig,
};
