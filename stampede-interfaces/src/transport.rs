//! Transport interface definitions
//!
//! The engine issues requests only through [`Transport`], so any HTTP client
//! (or a test double) can be plugged in without touching the execution code.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use stampede_core::Scenario;

/// A fully described request, built from a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl TransportRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }
}

impl From<&Scenario> for TransportRequest {
    fn from(scenario: &Scenario) -> Self {
        Self {
            method: scenario.method.clone(),
            url: scenario.url.clone(),
            headers: scenario.headers.clone(),
            body: scenario.body.clone(),
        }
    }
}

/// What the engine needs to know about a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
}

/// Request-level failures; recorded in metrics, never surfaced to callers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Send one request with a timeout and report its status
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request`, giving up after `timeout`
    ///
    /// Any HTTP status, including 4xx and 5xx, is a successful send and is
    /// returned as `Ok`. `Err` is reserved for failures below HTTP: timeouts,
    /// refused connections, DNS errors and malformed requests.
    async fn send(
        &self,
        request: &TransportRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_scenario() {
        let scenario = Scenario::new("POST", "http://localhost/items")
            .with_header("Content-Type", "application/json")
            .with_body("{\"a\":1}");

        let request = TransportRequest::from(&scenario);
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "http://localhost/items");
        assert_eq!(request.headers["Content-Type"], "application/json");
        assert_eq!(request.body.as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_error_messages() {
        let err = TransportError::Timeout(Duration::from_secs(2));
        assert_eq!(err.to_string(), "request timed out after 2s");

        let err = TransportError::Connect("refused".to_string());
        assert_eq!(err.to_string(), "connection failed: refused");
    }
}
