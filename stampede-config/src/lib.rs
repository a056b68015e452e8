//! Domain-driven configuration management for Stampede
//!
//! This crate provides configuration split by functional domain (engine,
//! HTTP transport, logging), with validation, defaults, YAML loading and
//! environment variable overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    engine::EngineConfig, http::HttpConfig, logging::LoggingConfig, StampedeConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_ms};
