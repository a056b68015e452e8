//! Single request execution and outcome classification

use std::sync::Arc;
use std::time::{Duration, Instant};

use stampede_core::Scenario;
use stampede_interfaces::{Transport, TransportError, TransportRequest};

/// Classified result of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Status in `[200, 400)`
    Success { status: u16 },
    /// Any other HTTP status
    HttpFailure { status: u16 },
    /// No HTTP response at all
    TransportFailure { error: String },
}

impl RequestOutcome {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        if (200..400).contains(&status) {
            RequestOutcome::Success { status }
        } else {
            RequestOutcome::HttpFailure { status }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success { .. })
    }

    /// Status code, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestOutcome::Success { status } | RequestOutcome::HttpFailure { status } => {
                Some(*status)
            }
            RequestOutcome::TransportFailure { .. } => None,
        }
    }
}

impl From<TransportError> for RequestOutcome {
    fn from(err: TransportError) -> Self {
        RequestOutcome::TransportFailure {
            error: err.to_string(),
        }
    }
}

/// Issues scenario requests through a shared transport
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send one request for `scenario` and measure its latency
    ///
    /// The timeout is passed to the transport and also enforced here, so a
    /// transport that ignores it still cannot stall a worker.
    pub async fn execute(&self, scenario: &Scenario, timeout: Duration) -> (RequestOutcome, Duration) {
        let request = TransportRequest::from(scenario);
        let started = Instant::now();

        let outcome = match tokio::time::timeout(timeout, self.transport.send(&request, timeout)).await
        {
            Ok(Ok(response)) => RequestOutcome::from_status(response.status),
            Ok(Err(err)) => err.into(),
            Err(_) => TransportError::Timeout(timeout).into(),
        };

        (outcome, started.elapsed())
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor").finish_non_exhaustive()
    }
}
