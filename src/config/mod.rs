//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps its Arc<ReflectorConfig>
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file is a valid config
//! - Only `[reflector]` settings are hot-reloadable; listener changes need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_viewer_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, ReflectorConfig, SecurityConfig,
    ServiceConfig, TimeoutConfig, TlsConfig, ViewerConfig,
};
