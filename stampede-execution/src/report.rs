//! Derived results, recommendations and reports

use chrono::{DateTime, Utc};
use std::time::Duration;

use stampede_core::{ExecutionStatus, LoadTestReport, TestDefinition, TestResult};

use crate::metrics::MetricsSnapshot;

/// Error rate (percent) above which capacity advice is given
pub const HIGH_ERROR_RATE_PERCENT: f64 = 5.0;

/// Average latency above which optimisation advice is given
pub const SLOW_RESPONSE_TIME: Duration = Duration::from_secs(2);

/// Throughput (requests/sec) below which scaling advice is given
pub const LOW_THROUGHPUT_RPS: f64 = 10.0;

const HIGH_ERROR_RATE_ADVICE: &str =
    "High error rate detected. Consider investigating server capacity and error handling.";
const SLOW_RESPONSE_ADVICE: &str =
    "Average response time is high. Consider optimizing database queries and caching.";
const LOW_THROUGHPUT_ADVICE: &str =
    "Low throughput detected. Consider scaling horizontally or optimizing server performance.";
const ACCEPTABLE_ADVICE: &str = "System performance appears to be within acceptable limits.";

/// Execution facts needed to turn a metrics snapshot into a result
#[derive(Debug, Clone)]
pub struct RunInfo<'a> {
    pub definition: &'a TestDefinition,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub elapsed: Duration,
    pub error_message: Option<String>,
}

/// Build a `TestResult` from a snapshot
pub fn generate_result(info: &RunInfo<'_>, snapshot: &MetricsSnapshot) -> TestResult {
    let avg_response_time = snapshot.avg_response_time();
    let requests_per_second = requests_per_second(snapshot.total_requests, info.elapsed);
    let error_rate = error_rate(snapshot.failed_requests, snapshot.total_requests);

    let recommendations = recommendations(error_rate, avg_response_time, requests_per_second);
    let summary = summary(
        info.definition,
        info.status,
        snapshot.total_requests,
        success_rate(snapshot.successful_requests, snapshot.total_requests),
        avg_response_time,
    );

    TestResult {
        test_id: info.definition.id,
        test_name: info.definition.name.clone(),
        status: info.status,
        started_at: info.started_at,
        ended_at: info.ended_at,
        elapsed: info.elapsed,
        total_requests: snapshot.total_requests,
        successful_requests: snapshot.successful_requests,
        failed_requests: snapshot.failed_requests,
        requests_per_second,
        avg_response_time,
        min_response_time: snapshot.min_response_time,
        max_response_time: snapshot.max_response_time,
        error_rate,
        status_code_distribution: snapshot.status_code_distribution.clone(),
        error_distribution: snapshot.error_distribution.clone(),
        recommendations,
        summary,
        error_message: info.error_message.clone(),
    }
}

/// Requests per second; zero when no time has elapsed
pub fn requests_per_second(total: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        0.0
    } else {
        total as f64 / seconds
    }
}

/// Failed requests as a percentage; zero when nothing was sent
pub fn error_rate(failed: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        failed as f64 / total as f64 * 100.0
    }
}

fn success_rate(successful: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        successful as f64 / total as f64 * 100.0
    }
}

/// Advice derived from fixed thresholds
pub fn recommendations(
    error_rate: f64,
    avg_response_time: Duration,
    requests_per_second: f64,
) -> Vec<String> {
    let mut advice = Vec::new();

    if error_rate > HIGH_ERROR_RATE_PERCENT {
        advice.push(HIGH_ERROR_RATE_ADVICE.to_string());
    }
    if avg_response_time > SLOW_RESPONSE_TIME {
        advice.push(SLOW_RESPONSE_ADVICE.to_string());
    }
    if requests_per_second < LOW_THROUGHPUT_RPS {
        advice.push(LOW_THROUGHPUT_ADVICE.to_string());
    }

    if advice.is_empty() {
        advice.push(ACCEPTABLE_ADVICE.to_string());
    }
    advice
}

fn summary(
    definition: &TestDefinition,
    status: ExecutionStatus,
    total: u64,
    success_rate: f64,
    avg_response_time: Duration,
) -> String {
    let phase = if status.is_terminal() {
        "completed"
    } else {
        "in progress"
    };
    format!(
        "Load test {} with {} concurrent users over {} seconds. Total requests: {}, Success rate: {:.2}%, Average response time: {:?}",
        phase, definition.concurrent_users, definition.duration_seconds, total, success_rate, avg_response_time
    )
}

/// Bundle a definition and its final result into a report
pub fn build_report(definition: &TestDefinition, result: &TestResult) -> LoadTestReport {
    LoadTestReport {
        test: definition.clone(),
        result: result.clone(),
        generated_at: Utc::now(),
        summary: result.summary.clone(),
        recommendations: result.recommendations.clone(),
    }
}
