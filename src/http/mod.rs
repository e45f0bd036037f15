//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → headers.rs (GET /api/headers → reflector)
//!     → response.rs (fixed failure body on faults and panics)
//!     → Send to client
//! ```

pub mod headers;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer, HEADERS_PATH};
