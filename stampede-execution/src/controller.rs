//! Execution controller: runs the workers of one load test to a terminal state

use chrono::Utc;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, info_span, warn, Instrument};

use stampede_core::{CancelReason, ExecutionStatus, Scenario, TestResult};
use stampede_interfaces::ResultStore;

use crate::execution::Execution;
use crate::executor::RequestExecutor;
use crate::registry::Registration;
use crate::report::{generate_result, RunInfo};
use crate::worker::{Worker, WorkerExit};

/// How long cancelled workers may take to exit before they are aborted
pub fn drain_timeout(request_timeout: Duration, request_delay: Duration, grace: Duration) -> Duration {
    request_timeout
        .saturating_add(request_delay)
        .saturating_add(grace)
}

/// Owns the worker tasks of one execution from start to finalisation
pub(crate) struct ExecutionController {
    execution: Arc<Execution>,
    executor: RequestExecutor,
    store: Arc<dyn ResultStore>,
    drain_grace: Duration,
    /// Dropping this removes the execution from its registry
    registration: Option<Registration>,
}

impl ExecutionController {
    pub(crate) fn new(
        execution: Arc<Execution>,
        executor: RequestExecutor,
        store: Arc<dyn ResultStore>,
        drain_grace: Duration,
        registration: Registration,
    ) -> Self {
        Self {
            execution,
            executor,
            store,
            drain_grace,
            registration: Some(registration),
        }
    }

    pub(crate) async fn run(self) {
        let span = info_span!("load_test", test_id = %self.execution.id());
        self.run_to_completion().instrument(span).await
    }

    async fn run_to_completion(mut self) {
        let execution = self.execution.clone();
        let definition = execution.definition();
        let worker_count = definition.worker_count();

        execution.transition(ExecutionStatus::Running);
        info!(
            "Starting load test '{}' with {} users for {}s",
            definition.name, worker_count, definition.duration_seconds
        );

        let scenarios: Arc<[Scenario]> = definition.scenarios.clone().into();
        let seed = fastrand::u64(..);
        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker::new(
                id,
                scenarios.clone(),
                self.executor.clone(),
                execution.metrics().clone(),
                execution.token().clone(),
                execution.request_timeout(),
                definition.request_delay(),
                seed,
            );
            workers.spawn(worker.run());
        }

        let mut exits = Vec::with_capacity(worker_count);
        let token = execution.token().clone();
        let deadline = tokio::time::sleep_until(execution.deadline().into());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    if execution.cancel(CancelReason::Deadline) {
                        info!("Load test duration elapsed, stopping workers");
                    }
                    break;
                }
                _ = token.cancelled() => {
                    info!("Stop requested, stopping workers");
                    break;
                }
                joined = workers.join_next() => match joined {
                    Some(joined) => exits.push(self.collect_exit(joined)),
                    None => {
                        debug!("All workers exited before the deadline");
                        break;
                    }
                },
            }
        }

        let drain = drain_timeout(
            execution.request_timeout(),
            definition.request_delay(),
            self.drain_grace,
        );
        let drained = tokio::time::timeout(drain, async {
            while let Some(joined) = workers.join_next().await {
                exits.push(self.collect_exit(joined));
            }
        })
        .await
        .is_ok();

        if !drained {
            warn!(
                "{} workers still running after {:?}, aborting",
                workers.len(),
                drain
            );
            workers.shutdown().await;
        }

        let (status, error_message) = self.terminal_status(drained, worker_count, &exits);
        execution.transition(status);

        let result = generate_result(
            &RunInfo {
                definition,
                status,
                started_at: execution.started_at(),
                ended_at: Some(Utc::now()),
                elapsed: execution.elapsed(),
                error_message,
            },
            &execution.metrics().snapshot(),
        );
        info!(
            "Load test '{}' finished: {} ({} requests, {:.2}% errors, {:.1} req/s)",
            definition.name,
            status,
            result.total_requests,
            result.error_rate,
            result.requests_per_second
        );

        self.finalize(result).await;
    }

    fn terminal_status(
        &self,
        drained: bool,
        worker_count: usize,
        exits: &[WorkerExit],
    ) -> (ExecutionStatus, Option<String>) {
        let mut panics = exits.iter().filter_map(|exit| match exit {
            WorkerExit::Panicked(message) => Some(message),
            _ => None,
        });
        let first_panic = panics.next();
        let panic_count = first_panic.map_or(0, |_| 1 + panics.count());

        if !drained {
            (ExecutionStatus::TimedOut, None)
        } else if worker_count > 0 && panic_count == worker_count {
            let message = first_panic.map(|m| format!("worker panicked: {}", m));
            (ExecutionStatus::Failed, message)
        } else if self.execution.cancel_reason() == Some(CancelReason::Stopped) {
            (ExecutionStatus::Cancelled, None)
        } else {
            (ExecutionStatus::Completed, None)
        }
    }

    fn collect_exit(&self, joined: Result<WorkerExit, JoinError>) -> WorkerExit {
        match joined {
            Ok(exit) => exit,
            Err(err) if err.is_panic() => {
                let message = panic_message(err.into_panic());
                warn!("Worker panicked: {}", message);
                self.execution
                    .metrics()
                    .record_error(&format!("worker panicked: {}", message));
                WorkerExit::Panicked(message)
            }
            Err(err) => {
                debug!("Worker task ended without finishing: {}", err);
                WorkerExit::Aborted
            }
        }
    }

    async fn finalize(&mut self, result: TestResult) {
        if let Err(e) = self.store.save_result(&result).await {
            error!(
                "Failed to save result for load test {}: {}",
                self.execution.id(),
                e
            );
        }

        if let Some(registration) = self.registration.take() {
            registration.release();
        }
        self.execution.finish(result);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
