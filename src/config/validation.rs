//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (collector sources must be routed)
//! - Validate value ranges (intervals > 0, ports valid, delays ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PipelineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::PipelineConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no routes configured")]
    NoRoutes,

    #[error("route has an empty source id")]
    EmptySourceId,

    #[error("route for '{0}' has an empty channel")]
    EmptyChannel(String),

    #[error("no ingest topics configured")]
    NoTopics,

    #[error("ingest port must be non-zero")]
    ZeroPort,

    #[error("ingest qos must be 0, 1 or 2, got {0}")]
    InvalidQos(u8),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("reconnect base delay ({base}ms) exceeds max delay ({max}ms)")]
    BackoffOrder { base: u64, max: u64 },

    #[error("cleaning.max_energy_export_kwh.{0} must be greater than zero")]
    EnergyBound(String),

    #[error("collector source '{0}' has no route")]
    UnroutedSource(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }
    for (source, channel) in &config.routes {
        if source.trim().is_empty() {
            errors.push(ValidationError::EmptySourceId);
        }
        if channel.trim().is_empty() {
            errors.push(ValidationError::EmptyChannel(source.clone()));
        }
    }

    if config.ingest.topics.iter().all(|t| t.trim().is_empty()) {
        errors.push(ValidationError::NoTopics);
    }
    if config.ingest.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.ingest.qos > 2 {
        errors.push(ValidationError::InvalidQos(config.ingest.qos));
    }
    if config.ingest.channel_capacity == 0 {
        errors.push(ValidationError::NotPositive("ingest.channel_capacity"));
    }

    let max_energy = config.cleaning.default_max_energy_export_kwh;
    if max_energy.is_nan() || max_energy <= 0.0 {
        errors.push(ValidationError::NotPositive("cleaning.default_max_energy_export_kwh"));
    }
    for (source, max_energy) in &config.cleaning.max_energy_export_kwh {
        if max_energy.is_nan() || *max_energy <= 0.0 {
            errors.push(ValidationError::EnergyBound(source.clone()));
        }
    }

    for source in &config.collector.sources {
        if !config.routes.contains_key(source) {
            errors.push(ValidationError::UnroutedSource(source.clone()));
        }
    }

    if config.aggregator.interval_secs == 0 {
        errors.push(ValidationError::NotPositive("aggregator.interval_secs"));
    }
    if config.aggregator.daily_limit == 0 {
        errors.push(ValidationError::NotPositive("aggregator.daily_limit"));
    }

    if config.reconnect.base_delay_ms > config.reconnect.max_delay_ms {
        errors.push(ValidationError::BackoffOrder {
            base: config.reconnect.base_delay_ms,
            max: config.reconnect.max_delay_ms,
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&PipelineConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = PipelineConfig::default();
        config.routes.clear();
        config.ingest.topics.clear();
        config.aggregator.interval_secs = 0;
        config.reconnect.base_delay_ms = 10_000;
        config.reconnect.max_delay_ms = 100;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::NoRoutes));
        assert!(errors.contains(&ValidationError::NoTopics));
        assert!(errors.contains(&ValidationError::NotPositive("aggregator.interval_secs")));
        assert!(errors.contains(&ValidationError::BackoffOrder { base: 10_000, max: 100 }));
    }

    #[test]
    fn test_collector_sources_must_be_routed() {
        let mut config = PipelineConfig::default();
        config.collector.sources = vec!["T101".into(), "T999".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::UnroutedSource("T999".into())]);
    }

    #[test]
    fn test_empty_channel() {
        let mut config = PipelineConfig::default();
        config.routes.insert("T104".into(), " ".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyChannel("T104".into())]);
    }

    #[test]
    fn test_energy_bounds_must_be_positive() {
        let mut config = PipelineConfig::default();
        config.cleaning.max_energy_export_kwh.insert("T102".into(), f64::NAN);
        config.cleaning.max_energy_export_kwh.insert("T103".into(), -1.0);
        config.cleaning.default_max_energy_export_kwh = 0.0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::NotPositive("cleaning.default_max_energy_export_kwh"),
                ValidationError::EnergyBound("T102".into()),
                ValidationError::EnergyBound("T103".into()),
            ]
        );
    }
}
