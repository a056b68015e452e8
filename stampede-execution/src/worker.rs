//! Virtual user loop

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use stampede_core::Scenario;

use crate::executor::RequestExecutor;
use crate::metrics::MetricsAggregator;
use crate::selector;

/// Per-worker request counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub requests_sent: u64,
    pub successes: u64,
    pub failures: u64,
}

/// How a worker task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The loop observed cancellation and returned
    Finished { worker_id: usize, stats: WorkerStats },
    /// The task panicked; carries the panic message
    Panicked(String),
    /// The task was aborted after the drain window expired
    Aborted,
}

impl WorkerExit {
    pub fn is_panic(&self) -> bool {
        matches!(self, WorkerExit::Panicked(_))
    }

    /// Requests sent by the worker, zero unless it finished cleanly
    pub fn requests_sent(&self) -> u64 {
        match self {
            WorkerExit::Finished { stats, .. } => stats.requests_sent,
            WorkerExit::Panicked(_) | WorkerExit::Aborted => 0,
        }
    }
}

/// One simulated user issuing requests until cancelled
pub struct Worker {
    id: usize,
    scenarios: Arc<[Scenario]>,
    executor: RequestExecutor,
    metrics: Arc<MetricsAggregator>,
    token: CancellationToken,
    request_timeout: Duration,
    request_delay: Duration,
    rng: fastrand::Rng,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        scenarios: Arc<[Scenario]>,
        executor: RequestExecutor,
        metrics: Arc<MetricsAggregator>,
        token: CancellationToken,
        request_timeout: Duration,
        request_delay: Duration,
        seed: u64,
    ) -> Self {
        Self {
            id,
            scenarios,
            executor,
            metrics,
            token,
            request_timeout,
            request_delay,
            rng: fastrand::Rng::with_seed(seed ^ (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        }
    }

    /// Run the select/execute/record/delay loop until cancellation
    ///
    /// A request still in flight when the token fires is dropped and not
    /// recorded.
    pub async fn run(mut self) -> WorkerExit {
        debug!("Worker {} started", self.id);
        let mut stats = WorkerStats::default();

        while !self.token.is_cancelled() {
            let Some(scenario) = selector::select(&self.scenarios, &mut self.rng) else {
                break;
            };
            trace!("Worker {} sending {}", self.id, scenario.label());

            let (outcome, latency) = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                result = self.executor.execute(scenario, self.request_timeout) => result,
            };

            self.metrics.record_outcome(&outcome, latency);
            stats.requests_sent += 1;
            if outcome.is_success() {
                stats.successes += 1;
            } else {
                stats.failures += 1;
            }

            if self.request_delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => break,
                    _ = tokio::time::sleep(self.request_delay) => {}
                }
            }
        }

        debug!(
            "Worker {} stopped: {} requests ({} ok, {} failed)",
            self.id, stats.requests_sent, stats.successes, stats.failures
        );
        WorkerExit::Finished {
            worker_id: self.id,
            stats,
        }
    }
}
