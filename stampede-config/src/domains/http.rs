//! HTTP transport configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_at_most, validate_positive, validate_required_string, Validatable};

/// HTTP client configuration shared by every worker of an engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent string sent with every request
    pub user_agent: String,

    /// Maximum number of redirects to follow; 0 disables redirects
    pub max_redirects: u32,

    /// Whether to verify TLS certificates
    #[serde(default = "crate::domains::utils::default_true")]
    pub verify_ssl: bool,

    /// TCP connect timeout
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub connect_timeout: Duration,

    /// Idle connections kept per host in the pool
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("Stampede/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
            verify_ssl: true,
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 1000,
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        validate_positive(self.connect_timeout.as_secs(), "connect_timeout", self.domain_name())?;
        validate_at_most(self.max_redirects, 100, "max_redirects", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}
