//! HTTP header reflector and its polling viewer.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod reflector;
pub mod viewer;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
