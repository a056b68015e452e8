//! In-memory result store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use stampede_core::{TestId, TestResult};
use stampede_interfaces::{PersistenceError, ResultStore};

/// Keeps the latest final result per test id in process memory
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: RwLock<HashMap<TestId, TestResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn save_result(&self, result: &TestResult) -> Result<(), PersistenceError> {
        self.results.write().insert(result.test_id, result.clone());
        Ok(())
    }

    async fn get_result(&self, test_id: TestId) -> Result<Option<TestResult>, PersistenceError> {
        Ok(self.results.read().get(&test_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsSnapshot;
    use crate::report::{generate_result, RunInfo};
    use chrono::Utc;
    use stampede_core::{ExecutionStatus, Scenario, TestDefinition};
    use std::time::Duration;

    fn result(id: i64, status: ExecutionStatus) -> TestResult {
        let definition = TestDefinition::new(
            TestId(id),
            "stored",
            1,
            1,
            vec![Scenario::new("GET", "http://localhost/")],
        );
        generate_result(
            &RunInfo {
                definition: &definition,
                status,
                started_at: Utc::now(),
                ended_at: Some(Utc::now()),
                elapsed: Duration::from_secs(1),
                error_message: None,
            },
            &MetricsSnapshot::default(),
        )
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = InMemoryResultStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get_result(TestId(1)).await.unwrap(), None);

        store.save_result(&result(1, ExecutionStatus::Completed)).await.unwrap();
        let stored = store.get_result(TestId(1)).await.unwrap().unwrap();
        assert_eq!(stored.status, ExecutionStatus::Completed);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_latest_result_replaces_earlier() {
        let store = InMemoryResultStore::new();
        store.save_result(&result(4, ExecutionStatus::Completed)).await.unwrap();
        store.save_result(&result(4, ExecutionStatus::Cancelled)).await.unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get_result(TestId(4)).await.unwrap().unwrap();
        assert_eq!(stored.status, ExecutionStatus::Cancelled);
    }
}
