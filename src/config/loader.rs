//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
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
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Configuration for the terminal viewer.
///
/// A given file is used as-is. Without one, logging is held at `warn` so
/// routine events do not interleave with the redrawn panes.
pub fn load_viewer_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = ServiceConfig::default();
            config.observability.log_level = "warn".into();
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[listener]\nbind_address = \"127.0.0.1:9000\"\n\n[reflector]\nserver_name = \"edge\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.reflector.server_name, "edge");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_config("[timeouts]\nrequest_secs = 0").unwrap_err();
        assert!(err.to_string().starts_with("Validation failed: timeouts.request_secs"));
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = parse_config("[listener\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn viewer_honours_configured_log_level() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[observability]\nlog_level = \"debug\"").unwrap();

        let config = load_viewer_config(Some(file.path())).unwrap();
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn viewer_without_file_is_quiet() {
        let config = load_viewer_config(None).unwrap();
        assert_eq!(config.observability.log_level, "warn");
        assert_eq!(config.viewer, ServiceConfig::default().viewer);
    }
}
