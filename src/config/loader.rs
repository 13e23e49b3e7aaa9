//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::PipelineConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load the file at `path`, or validated defaults when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = PipelineConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, ReportFormat};
    use std::io::Write;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.routes.len(), 3);
        assert_eq!(config.store.database, "wind_farm");
        assert_eq!(config.aggregator.interval_secs, 30);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[ingest]
host = "broker.local"
topics = ["farm/a/#"]

[routes]
A1 = "stream:A1"

[aggregator]
interval_secs = 60
source_id = "A1"
report_format = "json"

[observability]
log_format = "json"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ingest.host, "broker.local");
        assert_eq!(config.ingest.port, 1883);
        assert_eq!(config.routes.get("A1").map(String::as_str), Some("stream:A1"));
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.aggregator.source_id.as_deref(), Some("A1"));
        assert_eq!(config.aggregator.report_format, ReportFormat::Json);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = parse_config("[aggregator]\ninterval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("aggregator.interval_secs"));
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config = parse_config(include_str!("../../pipeline.example.toml")).unwrap();
        let defaults = PipelineConfig::default();
        assert_eq!(config.routes, defaults.routes);
        assert_eq!(config.ingest.topics, defaults.ingest.topics);
        assert_eq!(config.store.uri, defaults.store.uri);
        assert_eq!(config.aggregator.daily_limit, defaults.aggregator.daily_limit);
        assert_eq!(
            config.cleaning.max_energy_export_kwh,
            defaults.cleaning.max_energy_export_kwh
        );
        assert_eq!(
            config.cleaning.default_max_energy_export_kwh,
            defaults.cleaning.default_max_energy_export_kwh
        );
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[ingest\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/pipeline.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
