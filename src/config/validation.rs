//! Configuration validation.
//!
//! Serde handles the syntax; this module checks values that parse but make
//! no sense (unparseable addresses, zero timeouts, empty header values).
//! All errors are collected, not just the first.

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be > 0"));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if axum::http::HeaderValue::from_str(&config.reflector.powered_by).is_err() {
        errors.push(ValidationError::new(
            "reflector.powered_by",
            "must be a valid header value",
        ));
    }
    if config.reflector.server_name.trim().is_empty()
        || axum::http::HeaderValue::from_str(&config.reflector.server_name).is_err()
    {
        errors.push(ValidationError::new(
            "reflector.server_name",
            "must be a non-empty header value",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if config.viewer.poll_interval_secs == 0 {
        errors.push(ValidationError::new("viewer.poll_interval_secs", "must be > 0"));
    }
    if url::Url::parse(&config.viewer.endpoint).is_err() {
        errors.push(ValidationError::new("viewer.endpoint", "must be an absolute URL"));
    }
    if url::Url::parse(&config.viewer.siteverify_url).is_err() {
        errors.push(ValidationError::new(
            "viewer.siteverify_url",
            "must be an absolute URL",
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
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn reports_all_errors() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.viewer.poll_interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "timeouts.request_secs",
                "viewer.poll_interval_secs"
            ]
        );
    }

    #[test]
    fn rejects_header_unsafe_server_name() {
        let mut config = ServiceConfig::default();
        config.reflector.server_name = "bad\nname".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "reflector.server_name");
    }
}
