//! Result persistence interface

use async_trait::async_trait;
use thiserror::Error;

use stampede_core::{TestId, TestResult};

/// Errors reported by a result store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to serialize result: {0}")]
    Serialization(String),

    #[error("persistence error: {0}")]
    Other(String),
}

/// Stores final results produced by the engine
///
/// `save_result` is called once per finished execution. A failure there is
/// logged by the engine and does not change the execution's terminal status.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a final result, replacing any earlier result for the same test
    async fn save_result(&self, result: &TestResult) -> Result<(), PersistenceError>;

    /// Fetch the latest stored result for a test
    async fn get_result(&self, test_id: TestId) -> Result<Option<TestResult>, PersistenceError>;
}
