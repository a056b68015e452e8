//! Logging initialisation for Stampede
//!
//! The engine only emits `tracing` events; binaries and tests pick a
//! subscriber through this crate.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
