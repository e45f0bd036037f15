use std::time::{Instant, SystemTime};

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::response::failure_response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::reflector::{encode, reflect, ReflectError};

/// `GET /api/headers`: reflect the caller's request back as JSON.
pub async fn reflect_headers(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, _body) = request.into_parts();
    let settings = state.reflector.load();

    let encoded = encode(&reflect(&parts, &settings, SystemTime::now()));
    let response = payload_response(encoded, parts.uri.path());

    metrics::record_request(response.status().as_u16(), start_time);
    response
}

/// Map the encoded document, or the fault that prevented it, to a response.
pub(crate) fn payload_response(encoded: Result<Vec<u8>, ReflectError>, path: &str) -> Response {
    match encoded {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, path = %path, "Error fetching headers");
            metrics::record_extraction_failure();
            failure_response()
        }
    }
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}
