//! HTTP error types

use stampede_interfaces::TransportError;

/// Errors raised while building the client or a request
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Invalid header value for {0}")]
    InvalidHeaderValue(String),
}

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        TransportError::InvalidRequest(err.to_string())
    }
}
