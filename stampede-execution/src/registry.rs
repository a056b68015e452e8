//! Registry of active executions and the engine's query surface

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use stampede_config::EngineConfig;
use stampede_core::{validate_definition, CancelReason, TestDefinition, TestId, TestResult};
use stampede_interfaces::{ResultStore, Transport};

use crate::controller::{drain_timeout, ExecutionController};
use crate::error::EngineError;
use crate::execution::{same_execution, Execution};
use crate::executor::RequestExecutor;
use crate::store::InMemoryResultStore;

/// Map of active executions, keyed by test id
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    executions: Mutex<HashMap<TestId, Arc<Execution>>>,
}

impl RegistryState {
    /// Remove `execution` if it is still the one registered under its id
    fn remove(&self, execution: &Arc<Execution>) -> bool {
        let mut executions = self.executions.lock();
        match executions.get(&execution.id()) {
            Some(current) if same_execution(current, execution) => {
                executions.remove(&execution.id());
                true
            }
            _ => false,
        }
    }

    fn get(&self, test_id: TestId) -> Option<Arc<Execution>> {
        self.executions.lock().get(&test_id).cloned()
    }

    fn all(&self) -> Vec<Arc<Execution>> {
        self.executions.lock().values().cloned().collect()
    }

    fn active_count(&self) -> usize {
        count_active(&self.executions.lock())
    }
}

/// Entries that have not reached a terminal status; finished executions may
/// stay registered while their result is being saved
fn count_active(executions: &HashMap<TestId, Arc<Execution>>) -> usize {
    executions
        .values()
        .filter(|execution| execution.status().is_active())
        .count()
}

/// Keeps an execution registered until dropped
///
/// Dropping without [`release`](Registration::release) means the controller
/// never finished, so the execution is failed to unblock its waiters.
pub(crate) struct Registration {
    state: Arc<RegistryState>,
    execution: Arc<Execution>,
    released: bool,
}

impl Registration {
    fn new(state: Arc<RegistryState>, execution: Arc<Execution>) -> Self {
        Self {
            state,
            execution,
            released: false,
        }
    }

    /// Deregister after the controller finished normally
    pub(crate) fn release(mut self) {
        self.released = true;
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.state.remove(&self.execution);
        if !self.released {
            self.execution
                .abandon("execution controller exited before finishing");
        }
    }
}

/// Handle to a started execution
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    execution: Arc<Execution>,
    finished: watch::Receiver<Option<TestResult>>,
}

impl ExecutionHandle {
    fn new(execution: Arc<Execution>) -> Self {
        let finished = execution.subscribe();
        Self {
            execution,
            finished,
        }
    }

    pub fn id(&self) -> TestId {
        self.execution.id()
    }

    /// Final result if finished, live snapshot otherwise
    pub fn status(&self) -> TestResult {
        self.execution
            .final_result()
            .unwrap_or_else(|| self.execution.snapshot())
    }

    /// Request a stop; returns `false` if the execution was already cancelled
    pub fn cancel(&self) -> bool {
        self.execution.cancel(CancelReason::Stopped)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.borrow().is_some()
    }

    /// Wait for the final result
    pub async fn wait(&self) -> Result<TestResult, EngineError> {
        let mut finished = self.finished.clone();
        let result = finished
            .wait_for(Option::is_some)
            .await
            .map_err(|_| EngineError::Join("controller exited without a result".to_string()))?
            .clone();
        result.ok_or_else(|| EngineError::Join("controller exited without a result".to_string()))
    }
}

/// Owns every active execution and exposes start/stop/status/list/result
#[derive(Clone)]
pub struct ExecutionRegistry {
    state: Arc<RegistryState>,
    executor: RequestExecutor,
    store: Arc<dyn ResultStore>,
    config: EngineConfig,
}

impl ExecutionRegistry {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn ResultStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            state: Arc::new(RegistryState::default()),
            executor: RequestExecutor::new(transport),
            store,
            config,
        }
    }

    /// Registry with an in-memory result store and default engine settings
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::new(
            transport,
            Arc::new(InMemoryResultStore::new()),
            EngineConfig::default(),
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Validate and launch a load test
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, definition: TestDefinition) -> Result<ExecutionHandle, EngineError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| EngineError::Runtime(e.to_string()))?;
        let request_timeout = definition.request_timeout_or(self.config.default_request_timeout);

        let execution = {
            let mut executions = self.state.executions.lock();
            if executions
                .get(&definition.id)
                .is_some_and(|existing| existing.status().is_active())
            {
                return Err(EngineError::AlreadyRunning(definition.id));
            }
            validate_definition(&definition)?;
            if count_active(&executions) >= self.config.max_active_executions {
                return Err(EngineError::CapacityExhausted {
                    limit: self.config.max_active_executions,
                });
            }

            // a finished execution still saving its result is replaced; its
            // registration only removes the entry it inserted
            let execution = Arc::new(Execution::new(definition, request_timeout));
            executions.insert(execution.id(), execution.clone());
            execution
        };

        info!(
            "Registered load test {} ('{}')",
            execution.id(),
            execution.definition().name
        );

        let handle = ExecutionHandle::new(execution.clone());
        let registration = Registration::new(self.state.clone(), execution.clone());
        let controller = ExecutionController::new(
            execution,
            self.executor.clone(),
            self.store.clone(),
            self.config.drain_grace,
            registration,
        );
        runtime.spawn(controller.run());

        Ok(handle)
    }

    /// Ask a running load test to stop
    pub fn stop(&self, test_id: TestId) -> Result<(), EngineError> {
        let execution = self.active(test_id)?;
        if execution.cancel(CancelReason::Stopped) {
            info!("Stopping load test {}", test_id);
        }
        Ok(())
    }

    /// Live snapshot of a running load test
    pub fn status(&self, test_id: TestId) -> Result<TestResult, EngineError> {
        Ok(self.active(test_id)?.snapshot())
    }

    /// Live snapshots of all running load tests, ordered by id
    pub fn list(&self) -> Vec<TestResult> {
        let mut executions = self.state.all();
        executions.sort_by_key(|execution| execution.id());
        executions
            .iter()
            .filter(|execution| execution.status().is_active())
            .map(|execution| execution.snapshot())
            .collect()
    }

    /// Stored final result of a load test
    pub async fn result(&self, test_id: TestId) -> Result<Option<TestResult>, EngineError> {
        Ok(self.store.get_result(test_id).await?)
    }

    /// Number of registered executions that have not reached a terminal status
    pub fn active_count(&self) -> usize {
        self.state.active_count()
    }

    /// Stop every active execution and wait for them to finalise
    ///
    /// Returns the number of executions still registered when the wait
    /// gave up.
    pub async fn shutdown(&self) -> usize {
        let executions = self.state.all();
        if executions.is_empty() {
            return 0;
        }

        info!("Shutting down {} active load tests", executions.len());
        let mut bound = Duration::ZERO;
        let mut waiters = JoinSet::new();
        for execution in executions {
            execution.cancel(CancelReason::Stopped);
            bound = bound.max(drain_timeout(
                execution.request_timeout(),
                execution.definition().request_delay(),
                self.config.drain_grace,
            ));

            let handle = ExecutionHandle::new(execution);
            waiters.spawn(async move {
                let _ = handle.wait().await;
            });
        }

        let bound = bound.saturating_add(self.config.drain_grace);
        if tokio::time::timeout(bound, async {
            while waiters.join_next().await.is_some() {}
        })
        .await
        .is_err()
        {
            warn!("Shutdown gave up waiting after {:?}", bound);
        }

        self.state.executions.lock().len()
    }

    /// Registered execution that has not reached a terminal state
    fn active(&self, test_id: TestId) -> Result<Arc<Execution>, EngineError> {
        self.state
            .get(test_id)
            .filter(|execution| execution.status().is_active())
            .ok_or(EngineError::NotFound(test_id))
    }
}
