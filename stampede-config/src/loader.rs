//! Configuration loading and environment variable handling

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::domains::{engine::EngineConfig, http::HttpConfig, logging, StampedeConfig};
use crate::error::{ConfigError, ConfigResult};

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with the `STAMPEDE` prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: StampedeConfig = serde_yaml::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        let mut config = StampedeConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load from `config_path` if given, otherwise from defaults plus environment
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        self.apply_engine_overrides(&mut config.engine)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_engine_overrides(&self, config: &mut EngineConfig) -> ConfigResult<()> {
        if let Some(seconds) = self.parse_env::<u64>("REQUEST_TIMEOUT")? {
            config.default_request_timeout = Duration::from_secs(seconds);
        }

        if let Some(millis) = self.parse_env::<u64>("DRAIN_GRACE_MS")? {
            config.drain_grace = Duration::from_millis(millis);
        }

        if let Some(max) = self.parse_env::<usize>("MAX_ACTIVE_EXECUTIONS")? {
            config.max_active_executions = max;
        }

        Ok(())
    }

    fn apply_http_overrides(&self, config: &mut HttpConfig) -> ConfigResult<()> {
        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Some(verify_ssl) = self.parse_env::<bool>("HTTP_VERIFY_SSL")? {
            config.verify_ssl = verify_ssl;
        }

        if let Some(seconds) = self.parse_env::<u64>("HTTP_CONNECT_TIMEOUT")? {
            config.connect_timeout = Duration::from_secs(seconds);
        }

        if let Some(redirects) = self.parse_env::<u32>("HTTP_MAX_REDIRECTS")? {
            config.max_redirects = redirects;
        }

        Ok(())
    }

    fn apply_logging_overrides(&self, config: &mut logging::LoggingConfig) -> ConfigResult<()> {
        if let Some(level) = self.parse_env::<logging::LogLevel>("LOG_LEVEL")? {
            config.level = level;
        }

        if let Some(format) = self.parse_env::<logging::LogFormat>("LOG_FORMAT")? {
            config.format = format;
        }

        Ok(())
    }

    /// Parse a prefixed variable, `None` when unset
    fn parse_env<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
