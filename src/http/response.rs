//! Error responses.
//!
//! Faults never leak detail to the caller: every failure of the reflector,
//! including a panic in the handler stack, becomes the same fixed 500 body.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message returned on any reflection fault.
pub const FAILURE_MESSAGE: &str = "Failed to fetch headers";

/// `500 {"error":"Failed to fetch headers"}`.
pub fn failure_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": FAILURE_MESSAGE })),
    )
        .into_response()
}

/// Response produced by the catch-panic layer.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "Handler panicked");
    failure_response()
}
