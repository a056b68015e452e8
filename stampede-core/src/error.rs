//! Core error types for Stampede

use thiserror::Error;

/// Reasons a test definition is rejected before anything starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("test name is required")]
    EmptyName,

    #[error("concurrent users must be greater than 0, got {0}")]
    ConcurrencyTooLow(i64),

    #[error("concurrent users cannot exceed {max}, got {actual}")]
    ConcurrencyTooHigh { actual: i64, max: i64 },

    #[error("duration must be greater than 0, got {0}")]
    DurationTooShort(i64),

    #[error("duration cannot exceed {max} seconds, got {actual}")]
    DurationTooLong { actual: i64, max: i64 },

    #[error("at least one test scenario is required")]
    NoScenarios,

    #[error("scenario {index}: URL is required")]
    EmptyUrl { index: usize },

    #[error("scenario {index}: method is required")]
    EmptyMethod { index: usize },

    #[error("scenario {index}: weight cannot be negative, got {weight}")]
    NegativeWeight { index: usize, weight: i64 },
}
