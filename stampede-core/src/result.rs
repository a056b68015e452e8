//! Derived result snapshots and reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::definition::{TestDefinition, TestId};
use crate::execution::ExecutionStatus;

/// Derived snapshot of an execution's metrics
///
/// Computed on demand for live status queries and once, at finalisation, for
/// the result handed to persistence. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: TestId,
    pub test_name: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,

    /// Set only for results produced at finalisation
    pub ended_at: Option<DateTime<Utc>>,

    #[serde(with = "crate::serde_millis")]
    pub elapsed: Duration,

    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub requests_per_second: f64,

    #[serde(with = "crate::serde_millis")]
    pub avg_response_time: Duration,
    #[serde(with = "crate::serde_millis")]
    pub min_response_time: Duration,
    #[serde(with = "crate::serde_millis")]
    pub max_response_time: Duration,

    /// Percentage of failed requests, 0-100
    pub error_rate: f64,

    pub status_code_distribution: BTreeMap<u16, u64>,
    pub error_distribution: BTreeMap<String, u64>,
    pub recommendations: Vec<String>,
    pub summary: String,

    /// Captured orchestration failure, present for `Failed` results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TestResult {
    /// Percentage of successful requests, 0-100
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            100.0 - self.error_rate
        }
    }

    /// Whether this is a final result rather than a live snapshot
    pub fn is_final(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Load test report bundling a definition with its final result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTestReport {
    pub test: TestDefinition,
    pub result: TestResult,
    pub generated_at: DateTime<Utc>,
    pub summary: String,
    pub recommendations: Vec<String>,
}
