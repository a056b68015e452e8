//! Execution engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_at_most, validate_positive, Validatable};

/// Upper bound for simultaneously active executions
const MAX_ACTIVE_EXECUTIONS_LIMIT: usize = 1024;

/// Load test engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-request timeout used when a definition leaves it unset
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub default_request_timeout: Duration,

    /// Extra time granted to workers after cancellation before they are aborted
    #[serde(with = "crate::domains::utils::serde_duration_ms")]
    pub drain_grace: Duration,

    /// Maximum number of executions that may be active at once
    pub max_active_executions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_request_timeout: Duration::from_secs(30),
            drain_grace: Duration::from_secs(2),
            max_active_executions: 16,
        }
    }
}

impl Validatable for EngineConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.default_request_timeout.as_secs(),
            "default_request_timeout",
            self.domain_name(),
        )?;
        validate_positive(
            self.max_active_executions,
            "max_active_executions",
            self.domain_name(),
        )?;
        validate_at_most(
            self.max_active_executions,
            MAX_ACTIVE_EXECUTIONS_LIMIT,
            "max_active_executions",
            self.domain_name(),
        )?;

        if self.drain_grace > Duration::from_secs(300) {
            return Err(self.validation_error("drain_grace cannot exceed 300 seconds"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "engine"
    }
}
