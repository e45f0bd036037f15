//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the reflector
//! and the viewer. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Header reflection settings.
    pub reflector: ReflectorConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Header viewer client settings.
    pub viewer: ViewerConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum requests handled concurrently (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_connections: 10_000,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Settings consulted by the header reflector on every request.
///
/// These are the only settings that take effect on hot reload.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReflectorConfig {
    /// Resolve the client address and scheme from `X-Real-IP`, `Forwarded`,
    /// `X-Forwarded-For` and `X-Forwarded-Proto`.
    ///
    /// Only safe behind a reverse proxy that overwrites these headers.
    pub trust_proxy_headers: bool,

    /// Value of the illustrative `x-powered-by` response header.
    pub powered_by: String,

    /// Value of the illustrative `server` response header.
    pub server_name: String,
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            trust_proxy_headers: false,
            powered_by: "axum".to_string(),
            server_name: "nginx/1.18.0 (Ubuntu)".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add `x-content-type-options` to responses.
    pub enable_headers: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Header viewer client configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Full URL of the reflector endpoint.
    pub endpoint: String,

    /// Fixed polling period in seconds.
    pub poll_interval_secs: u64,

    /// Turnstile token verification endpoint.
    pub siteverify_url: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/api/headers".to_string(),
            poll_interval_secs: 5,
            siteverify_url: "https://challenges.cloudflare.com/turnstile/v0/siteverify"
                .to_string(),
        }
    }
}
