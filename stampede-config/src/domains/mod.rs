//! Domain-specific configuration modules

pub mod engine;
pub mod http;
pub mod logging;
pub mod utils;

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::validation::Validatable;

/// Complete Stampede configuration, one section per domain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StampedeConfig {
    /// Execution engine limits and timeouts
    #[serde(default)]
    pub engine: engine::EngineConfig,

    /// HTTP transport configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.engine.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample = Self::default();
        serde_yaml::to_string(&sample).unwrap_or_else(|_| "# Failed to generate sample".to_string())
    }
}
