//! Header reflection.
//!
//! # Data Flow
//! ```text
//! request::Parts (headers, method, uri, version, extensions)
//!     → headers.rs (request header table, illustrative response headers)
//!     → client.rs  (client address, scheme, protocol version)
//!     → payload.rs (DeviceInfo, HeadersPayload)
//!     → JSON body of GET /api/headers
//! ```
//!
//! Everything here is a pure function of one request plus the current
//! settings snapshot; nothing is cached between requests.

pub mod client;
pub mod headers;
pub mod payload;

pub use client::{
    http_version_label, resolve_client_ip, resolve_protocol, TransportScheme, UNKNOWN_ADDRESS,
};
pub use headers::{collect_request_headers, illustrative_response_headers, HeaderTable};
pub use payload::{encode, iso_timestamp, reflect, DeviceInfo, HeadersPayload, ReflectError};
