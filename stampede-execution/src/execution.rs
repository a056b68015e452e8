//! Shared state of one running load test

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use stampede_core::{CancelReason, ExecutionStatus, TestDefinition, TestId, TestResult};

use crate::metrics::MetricsAggregator;
use crate::report::{generate_result, RunInfo};

/// An active execution, shared by the registry, its controller and handles
#[derive(Debug)]
pub struct Execution {
    definition: TestDefinition,
    started_at: DateTime<Utc>,
    started: Instant,
    deadline: Instant,
    request_timeout: Duration,
    status: Mutex<ExecutionStatus>,
    token: CancellationToken,
    cancel_reason: OnceLock<CancelReason>,
    metrics: Arc<MetricsAggregator>,
    finished: watch::Sender<Option<TestResult>>,
}

impl Execution {
    pub fn new(definition: TestDefinition, request_timeout: Duration) -> Self {
        let started = Instant::now();
        let deadline = started + definition.duration();
        let (finished, _) = watch::channel(None);

        Self {
            definition,
            started_at: Utc::now(),
            started,
            deadline,
            request_timeout,
            status: Mutex::new(ExecutionStatus::Pending),
            token: CancellationToken::new(),
            cancel_reason: OnceLock::new(),
            metrics: Arc::new(MetricsAggregator::new()),
            finished,
        }
    }

    pub fn id(&self) -> TestId {
        self.definition.id
    }

    pub fn definition(&self) -> &TestDefinition {
        &self.definition
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Monotonic instant at which the run should end
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn status(&self) -> ExecutionStatus {
        *self.status.lock()
    }

    /// Move to `next` if the state machine allows it
    pub fn transition(&self, next: ExecutionStatus) -> bool {
        let mut status = self.status.lock();
        if status.can_transition_to(next) {
            debug!("Load test {} transitioned {} -> {}", self.id(), *status, next);
            *status = next;
            true
        } else {
            debug!(
                "Load test {} ignored transition {} -> {}",
                self.id(),
                *status,
                next
            );
            false
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn metrics(&self) -> &Arc<MetricsAggregator> {
        &self.metrics
    }

    /// Signal cancellation; returns `false` if a reason was already recorded
    pub fn cancel(&self, reason: CancelReason) -> bool {
        let first = self.cancel_reason.set(reason).is_ok();
        if first {
            debug!("Load test {} cancelled: {}", self.id(), reason);
        }
        self.token.cancel();
        first
    }

    /// Reason of the first cancellation, if any
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        self.cancel_reason.get().copied()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Live result computed from the current metrics
    pub fn snapshot(&self) -> TestResult {
        self.result_with(self.status(), None, None)
    }

    /// Result from the current metrics with an explicit status
    pub(crate) fn result_with(
        &self,
        status: ExecutionStatus,
        ended_at: Option<DateTime<Utc>>,
        error_message: Option<String>,
    ) -> TestResult {
        let snapshot = self.metrics.snapshot();
        generate_result(
            &RunInfo {
                definition: &self.definition,
                status,
                started_at: self.started_at,
                ended_at,
                elapsed: self.elapsed(),
                error_message,
            },
            &snapshot,
        )
    }

    /// Fail an execution whose controller went away without finishing it
    pub(crate) fn abandon(&self, reason: &str) {
        if self.final_result().is_some() {
            return;
        }
        warn!("Load test {} abandoned: {}", self.id(), reason);
        self.token.cancel();
        self.transition(ExecutionStatus::Failed);
        let result = self.result_with(
            ExecutionStatus::Failed,
            Some(Utc::now()),
            Some(reason.to_string()),
        );
        self.finish(result);
    }

    /// Publish the final result to every waiting handle
    pub(crate) fn finish(&self, result: TestResult) {
        self.finished.send_replace(Some(result));
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<TestResult>> {
        self.finished.subscribe()
    }

    /// Final result, once the controller has published it
    pub fn final_result(&self) -> Option<TestResult> {
        self.finished.borrow().clone()
    }
}

/// Compare two executions by identity rather than by test id
pub(crate) fn same_execution(a: &Arc<Execution>, b: &Arc<Execution>) -> bool {
    Arc::ptr_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_core::Scenario;

    fn execution() -> Execution {
        let definition = TestDefinition::new(
            TestId(1),
            "smoke",
            2,
            5,
            vec![Scenario::new("GET", "http://localhost/")],
        );
        Execution::new(definition, Duration::from_secs(3))
    }

    #[test]
    fn test_new_execution_is_pending() {
        let execution = execution();
        assert_eq!(execution.status(), ExecutionStatus::Pending);
        assert!(!execution.is_cancelled());
        assert_eq!(execution.cancel_reason(), None);
        assert_eq!(
            execution.deadline().duration_since(execution.started),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_transitions_follow_state_machine() {
        let execution = execution();
        assert!(execution.transition(ExecutionStatus::Running));
        assert!(!execution.transition(ExecutionStatus::Pending));
        assert!(execution.transition(ExecutionStatus::Completed));
        assert!(!execution.transition(ExecutionStatus::Cancelled));
        assert_eq!(execution.status(), ExecutionStatus::Completed);
    }

    #[test]
    fn test_first_cancel_reason_wins() {
        let execution = execution();
        assert!(execution.cancel(CancelReason::Stopped));
        assert!(!execution.cancel(CancelReason::Deadline));
        assert!(execution.is_cancelled());
        assert_eq!(execution.cancel_reason(), Some(CancelReason::Stopped));
    }

    #[test]
    fn test_live_snapshot() {
        let execution = execution();
        execution.transition(ExecutionStatus::Running);
        execution
            .metrics()
            .record_success(Duration::from_millis(20), 200);

        let result = execution.snapshot();
        assert_eq!(result.test_id, TestId(1));
        assert_eq!(result.status, ExecutionStatus::Running);
        assert_eq!(result.total_requests, 1);
        assert_eq!(result.ended_at, None);
        assert!(!result.is_final());
    }

    #[test]
    fn test_abandon_publishes_failure_once() {
        let execution = execution();
        execution.transition(ExecutionStatus::Running);
        execution.abandon("controller went away");

        let result = execution.final_result().unwrap();
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.error_message.as_deref(), Some("controller went away"));
        assert!(execution.is_cancelled());

        execution.abandon("again");
        assert_eq!(
            execution.final_result().unwrap().error_message.as_deref(),
            Some("controller went away")
        );
    }

    #[tokio::test]
    async fn test_finish_reaches_late_subscribers() {
        let execution = execution();
        let mut early = execution.subscribe();

        let mut result = execution.snapshot();
        result.status = ExecutionStatus::Completed;
        execution.finish(result.clone());

        early.changed().await.unwrap();
        assert_eq!(early.borrow().as_ref(), Some(&result));
        assert_eq!(execution.subscribe().borrow().as_ref(), Some(&result));
        assert_eq!(execution.final_result(), Some(result));
    }
}
