//! Client address, scheme and protocol version resolution.

use std::net::{IpAddr, SocketAddr};

use axum::http::{HeaderMap, Version};

/// Reported when no client address can be determined.
pub const UNKNOWN_ADDRESS: &str = "Unknown";

/// Scheme of the listener that accepted the connection.
///
/// Inserted into request extensions by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportScheme {
    #[default]
    Http,
    Https,
}

impl TransportScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportScheme::Http => "http",
            TransportScheme::Https => "https",
        }
    }
}

/// Resolve the client address for display.
///
/// Forwarding headers are only consulted when `trust_proxy_headers` is set,
/// in the order `X-Real-IP`, `Forwarded`, `X-Forwarded-For`. Then the peer
/// address of the connection, then [`UNKNOWN_ADDRESS`].
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_client_ip(headers) {
            return ip.to_string();
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_ADDRESS.to_string(),
    }
}

fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(ip) = header_str(headers, "x-real-ip").and_then(parse_ip) {
        return Some(ip);
    }
    if let Some(ip) = header_str(headers, "forwarded").and_then(parse_forwarded_for) {
        return Some(ip);
    }
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First `for=` node of an RFC 7239 `Forwarded` header.
fn parse_forwarded_for(value: &str) -> Option<IpAddr> {
    value
        .split(',')
        .flat_map(|element| element.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("for"))
        .and_then(|(_, node)| parse_ip(node))
}

/// Accepts `1.2.3.4`, `1.2.3.4:80`, `::1`, `[::1]:80` and quoted forms.
fn parse_ip(raw: &str) -> Option<IpAddr> {
    let s = raw.trim().trim_matches('"');
    if let Ok(ip) = s.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Some(addr.ip());
    }
    s.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .ok()
}

/// `http` or `https`.
///
/// With `trust_proxy_headers`, the first `X-Forwarded-Proto` entry wins when
/// it names one of the two.
pub fn resolve_protocol(
    headers: &HeaderMap,
    transport: TransportScheme,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        let forwarded = header_str(headers, "x-forwarded-proto")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase());
        if let Some(proto) = forwarded {
            if proto == "http" || proto == "https" {
                return proto;
            }
        }
    }
    transport.as_str().to_string()
}

/// Version number without the `HTTP/` prefix, e.g. `1.1` or `2.0`.
pub fn http_version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_11 => "1.1",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "unknown",
    }
}
