//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate an upper bound
pub fn validate_at_most<T>(value: T, max: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value > max {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot exceed {}, got {}", field_name, max, value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_string() {
        assert!(validate_required_string("x", "field", "test").is_ok());
        let err = validate_required_string("", "field", "test").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Domain configuration error in test: field cannot be empty"
        );
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1u64, "n", "test").is_ok());
        assert!(validate_positive(0u64, "n", "test").is_err());
    }

    #[test]
    fn test_validate_at_most() {
        assert!(validate_at_most(5, 5, "n", "test").is_ok());
        assert!(validate_at_most(6, 5, "n", "test").is_err());
    }
}
