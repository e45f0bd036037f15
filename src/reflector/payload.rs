//! The reflected document.

use std::net::SocketAddr;
use std::time::SystemTime;

use axum::extract::ConnectInfo;
use axum::http::{header::USER_AGENT, request::Parts};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ReflectorConfig;
use crate::reflector::client::{
    http_version_label, resolve_client_ip, resolve_protocol, TransportScheme,
};
use crate::reflector::headers::{
    collect_request_headers, decode_value, illustrative_response_headers, HeaderTable,
};

/// Failure while producing the reflected document.
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Connection and request metadata of one reflected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    pub ip: String,
    pub method: String,
    pub url: String,
    pub protocol: String,
    pub http_version: String,
    /// Time the payload was built, not the time the request arrived.
    pub timestamp: String,
}

/// Body of `GET /api/headers`.
///
/// Decoding is lenient so the viewer can render partial documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadersPayload {
    #[serde(default)]
    pub request_headers: HeaderTable,
    #[serde(default)]
    pub device_info: Option<DeviceInfo>,
    #[serde(default)]
    pub response_headers: HeaderTable,
}

/// ISO-8601 UTC instant with millisecond precision.
pub fn iso_timestamp(now: SystemTime) -> String {
    DateTime::<Utc>::from(now).to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl DeviceInfo {
    /// Capture metadata from request parts.
    ///
    /// The peer address and listener scheme are read from the
    /// `ConnectInfo<SocketAddr>` and [`TransportScheme`] extensions; either
    /// may be missing.
    pub fn capture(parts: &Parts, settings: &ReflectorConfig, now: SystemTime) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let transport = parts
            .extensions
            .get::<TransportScheme>()
            .copied()
            .unwrap_or_default();

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .map(decode_value)
            .unwrap_or_default();

        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string();

        Self {
            user_agent,
            ip: resolve_client_ip(&parts.headers, peer, settings.trust_proxy_headers),
            method: parts.method.as_str().to_string(),
            url,
            protocol: resolve_protocol(&parts.headers, transport, settings.trust_proxy_headers),
            http_version: http_version_label(parts.version).to_string(),
            timestamp: iso_timestamp(now),
        }
    }
}

/// Build the full document for one request.
pub fn reflect(parts: &Parts, settings: &ReflectorConfig, now: SystemTime) -> HeadersPayload {
    HeadersPayload {
        request_headers: collect_request_headers(&parts.headers),
        device_info: Some(DeviceInfo::capture(parts, settings, now)),
        response_headers: illustrative_response_headers(settings, now),
    }
}

/// Encode the document as the JSON response body.
pub fn encode(payload: &HeadersPayload) -> Result<Vec<u8>, ReflectError> {
    Ok(serde_json::to_vec(payload)?)
}
