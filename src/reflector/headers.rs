//! Request header capture and the illustrative response header table.

use std::time::SystemTime;

use axum::http::{HeaderMap, HeaderValue};
use indexmap::IndexMap;

use crate::config::ReflectorConfig;

/// Header name to value, in the order the entries were produced.
pub type HeaderTable = IndexMap<String, String>;

/// Capture the request's header table.
///
/// Names come out lower-cased (the `http` crate normalizes them on parse)
/// and in table order. Repeated headers are joined with `", "`. Empty values
/// are dropped, and a name with no non-empty value is left out entirely.
/// Values are decoded as UTF-8; invalid sequences become U+FFFD.
pub fn collect_request_headers(headers: &HeaderMap) -> HeaderTable {
    let mut table = HeaderTable::with_capacity(headers.keys_len());

    for name in headers.keys() {
        let values: Vec<_> = headers
            .get_all(name)
            .iter()
            .map(decode_value)
            .filter(|text| !text.is_empty())
            .collect();

        if !values.is_empty() {
            table.insert(name.as_str().to_owned(), values.join(", "));
        }
    }

    table
}

/// Header value as text. Obs-text bytes are legal on the wire, so this
/// never fails.
pub fn decode_value(value: &HeaderValue) -> String {
    match value.to_str() {
        Ok(text) => text.to_owned(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    }
}

/// Headers the service would typically answer with.
///
/// This is descriptive example data, not a capture of what goes on the wire
/// for the current exchange. Only `date` varies, and only with `now`.
pub fn illustrative_response_headers(settings: &ReflectorConfig, now: SystemTime) -> HeaderTable {
    let mut table = HeaderTable::with_capacity(6);
    table.insert("content-type".into(), "application/json".into());
    table.insert("x-powered-by".into(), settings.powered_by.clone());
    table.insert("access-control-allow-origin".into(), "*".into());
    table.insert("date".into(), httpdate::fmt_http_date(now));
    table.insert("connection".into(), "keep-alive".into());
    table.insert("server".into(), settings.server_name.clone());
    table
}
