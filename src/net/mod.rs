//! Network layer subsystem.
//!
//! Plain TCP is accepted directly by `axum::serve`; this module only holds
//! the TLS material loading used when `[listener.tls]` is configured.

pub mod tls;

pub use tls::load_tls_config;
