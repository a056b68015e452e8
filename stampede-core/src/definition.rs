//! Test definition domain model

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Unique identifier for a test definition (newtype pattern for type safety)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(pub i64);

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TestId {
    fn from(id: i64) -> Self {
        TestId(id)
    }
}

/// A single request template with a relative selection weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Optional human-readable name
    #[serde(default)]
    pub name: String,

    /// Target URL
    pub url: String,

    /// HTTP method, e.g. `GET`
    pub method: String,

    /// Request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Optional raw request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Relative selection weight; must not be negative
    #[serde(default)]
    pub weight: i64,
}

impl Scenario {
    /// Create a scenario with weight 1 and no headers or body
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            url: url.into(),
            method: method.into(),
            headers: HashMap::new(),
            body: None,
            weight: 1,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Label used in logs: the name if set, otherwise `METHOD url`
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("{} {}", self.method, self.url)
        } else {
            self.name.clone()
        }
    }
}

/// Read-only description of a load test, created and stored by a collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    /// Test identifier; at most one execution per id may be active
    pub id: TestId,

    /// Display name; must not be empty
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Number of virtual users (workers)
    pub concurrent_users: i64,

    /// Run duration in seconds
    pub duration_seconds: i64,

    /// Per-request timeout in seconds; 0 selects the engine default
    #[serde(default)]
    pub request_timeout_seconds: u64,

    /// Delay between two requests of the same worker, in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,

    /// Ordered list of weighted scenarios
    pub scenarios: Vec<Scenario>,
}

impl TestDefinition {
    /// Create a definition with no timeout override and no delay
    pub fn new(
        id: impl Into<TestId>,
        name: impl Into<String>,
        concurrent_users: i64,
        duration_seconds: i64,
        scenarios: Vec<Scenario>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            concurrent_users,
            duration_seconds,
            request_timeout_seconds: 0,
            request_delay_ms: 0,
            scenarios,
        }
    }

    pub fn with_request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_seconds = seconds;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Run duration; zero for non-positive values
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds.max(0) as u64)
    }

    /// Inter-request delay
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Per-request timeout, falling back to `default` when unset
    pub fn request_timeout_or(&self, default: Duration) -> Duration {
        if self.request_timeout_seconds == 0 {
            default
        } else {
            Duration::from_secs(self.request_timeout_seconds)
        }
    }

    /// Number of workers to spawn; zero for non-positive values
    pub fn worker_count(&self) -> usize {
        self.concurrent_users.max(0) as usize
    }
}
