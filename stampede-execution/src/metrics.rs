//! Live metrics aggregation shared by all workers of an execution

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::executor::RequestOutcome;

/// Concurrent-safe accumulator of request metrics
///
/// Counters are atomics so they can be read cheaply, but they are only ever
/// incremented while `stats` is locked. A snapshot taken under the same lock
/// therefore always satisfies `total == successful + failed`.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    stats: Mutex<LatencyStats>,
}

#[derive(Debug, Default)]
struct LatencyStats {
    total_response_time: Duration,
    min_response_time: Option<Duration>,
    max_response_time: Duration,
    status_codes: BTreeMap<u16, u64>,
    errors: BTreeMap<String, u64>,
}

impl LatencyStats {
    fn observe(&mut self, latency: Duration) {
        self.total_response_time = self.total_response_time.saturating_add(latency);
        self.min_response_time = Some(match self.min_response_time {
            Some(min) => min.min(latency),
            None => latency,
        });
        self.max_response_time = self.max_response_time.max(latency);
    }
}

/// Point-in-time copy of an aggregator's state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_response_time: Duration,
    /// Zero when no request has been recorded
    pub min_response_time: Duration,
    pub max_response_time: Duration,
    pub status_code_distribution: BTreeMap<u16, u64>,
    pub error_distribution: BTreeMap<String, u64>,
}

impl MetricsSnapshot {
    /// Mean latency over all recorded requests
    pub fn avg_response_time(&self) -> Duration {
        if self.total_requests == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_response_time.as_nanos() / u128::from(self.total_requests);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request that returned a success status
    pub fn record_success(&self, latency: Duration, status: u16) {
        let mut stats = self.stats.lock();
        stats.observe(latency);
        *stats.status_codes.entry(status).or_insert(0) += 1;
        self.successful.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed request
    ///
    /// HTTP failures carry a status; transport failures carry an error message
    /// instead and never touch the status histogram.
    pub fn record_failure(&self, latency: Duration, status: Option<u16>, error: Option<&str>) {
        let mut stats = self.stats.lock();
        stats.observe(latency);
        if let Some(status) = status {
            *stats.status_codes.entry(status).or_insert(0) += 1;
        }
        if let Some(error) = error {
            *stats.errors.entry(error.to_string()).or_insert(0) += 1;
        }
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failure that produced no latency sample, such as a worker panic
    pub fn record_error(&self, error: &str) {
        let mut stats = self.stats.lock();
        *stats.errors.entry(error.to_string()).or_insert(0) += 1;
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a classified request outcome
    pub fn record_outcome(&self, outcome: &RequestOutcome, latency: Duration) {
        match outcome {
            RequestOutcome::Success { status } => self.record_success(latency, *status),
            RequestOutcome::HttpFailure { status } => {
                self.record_failure(latency, Some(*status), None)
            }
            RequestOutcome::TransportFailure { error } => {
                self.record_failure(latency, None, Some(error.as_str()))
            }
        }
    }

    /// Consistent copy of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let stats = self.stats.lock();
        MetricsSnapshot {
            total_requests: self.total.load(Ordering::Relaxed),
            successful_requests: self.successful.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            total_response_time: stats.total_response_time,
            min_response_time: stats.min_response_time.unwrap_or(Duration::ZERO),
            max_response_time: stats.max_response_time,
            status_code_distribution: stats.status_codes.clone(),
            error_distribution: stats.errors.clone(),
        }
    }
}
