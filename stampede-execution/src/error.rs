//! Error types for the execution engine

use thiserror::Error;

use stampede_core::{TestId, ValidationError};
use stampede_interfaces::PersistenceError;

/// Errors returned by registry operations
///
/// Request-level failures never appear here; they are recorded in the
/// execution's metrics instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid test definition: {0}")]
    Validation(#[from] ValidationError),

    #[error("Load test {0} is already running")]
    AlreadyRunning(TestId),

    #[error("Load test {0} is not running")]
    NotFound(TestId),

    #[error("Maximum number of active load tests reached ({limit})")]
    CapacityExhausted { limit: usize },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Execution task failed: {0}")]
    Join(String),

    #[error("No async runtime available: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EngineError::AlreadyRunning(TestId(3)).to_string(),
            "Load test 3 is already running"
        );
        assert_eq!(
            EngineError::NotFound(TestId(9)).to_string(),
            "Load test 9 is not running"
        );

        let err: EngineError = ValidationError::NoScenarios.into();
        assert!(matches!(err, EngineError::Validation(ValidationError::NoScenarios)));
    }
}
