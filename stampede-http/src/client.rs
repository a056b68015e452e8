//! reqwest implementation of the transport interface

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::time::Duration;
use tracing::{debug, trace};

use stampede_config::HttpConfig;
use stampede_interfaces::{Transport, TransportError, TransportRequest, TransportResponse};

use crate::errors::HttpError;

/// Transport that sends scenario requests with a shared connection pool
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport from HTTP configuration
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HTTP transport (user agent: {}, connect timeout: {}s)",
            config.user_agent,
            config.connect_timeout.as_secs()
        );

        let redirect = if config.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(config.max_redirects as usize)
        };

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(redirect)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()?;

        Ok(Self { client })
    }

    /// Build a transport with default HTTP configuration
    pub fn with_defaults() -> Result<Self, HttpError> {
        Self::new(&HttpConfig::default())
    }

    fn build(
        &self,
        request: &TransportRequest,
        timeout: Duration,
    ) -> Result<reqwest::RequestBuilder, HttpError> {
        let method = parse_method(&request.method)?;
        let headers = build_headers(&request.headers)?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(headers)
            .timeout(timeout);

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        Ok(builder)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &TransportRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let builder = self.build(request, timeout)?;

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(e, timeout))?;
        let status = response.status().as_u16();

        // Read the body so the connection returns to the pool
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(e, timeout))?;
        trace!("{} {} -> {} ({} bytes)", request.method, request.url, status, body.len());

        Ok(TransportResponse { status })
    }
}

/// Parse a method string, accepting any case and extension methods
fn parse_method(method: &str) -> Result<Method, HttpError> {
    let upper = method.trim().to_ascii_uppercase();
    Method::from_bytes(upper.as_bytes()).map_err(|_| HttpError::InvalidMethod(method.to_string()))
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, HttpError> {
    let mut header_map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| HttpError::InvalidHeaderName(key.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| HttpError::InvalidHeaderValue(key.clone()))?;
        header_map.insert(name, value);
    }
    Ok(header_map)
}

fn classify_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(error_chain(&err))
    } else if err.is_builder() {
        TransportError::InvalidRequest(error_chain(&err))
    } else {
        TransportError::Other(error_chain(&err))
    }
}

/// Render an error with its sources, innermost last
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{any, get};
    use axum::Router;

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/fail", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            )
            .route(
                "/echo-header",
                any(|headers: AxumHeaders| async move {
                    if headers.get("x-probe").and_then(|v| v.to_str().ok()) == Some("yes") {
                        StatusCode::NO_CONTENT
                    } else {
                        StatusCode::BAD_REQUEST
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method(" Post ").unwrap(), Method::POST);
        assert_eq!(parse_method("PURGE").unwrap().as_str(), "PURGE");
        assert!(matches!(parse_method("GE T"), Err(HttpError::InvalidMethod(_))));
    }

    #[test]
    fn test_build_headers() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let map = build_headers(&headers).unwrap();
        assert_eq!(map["content-type"], "application/json");

        headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(build_headers(&headers), Err(HttpError::InvalidHeaderName(_))));
    }

    #[tokio::test]
    async fn test_http_status_passthrough() {
        let base = spawn_server().await;
        let transport = ReqwestTransport::with_defaults().unwrap();
        let timeout = Duration::from_secs(5);

        let ok = transport
            .send(&TransportRequest::new("GET", format!("{}/ok", base)), timeout)
            .await
            .unwrap();
        assert_eq!(ok.status, 200);

        let fail = transport
            .send(&TransportRequest::new("GET", format!("{}/fail", base)), timeout)
            .await
            .unwrap();
        assert_eq!(fail.status, 500);
    }

    #[tokio::test]
    async fn test_headers_are_sent() {
        let base = spawn_server().await;
        let transport = ReqwestTransport::with_defaults().unwrap();

        let mut request = TransportRequest::new("POST", format!("{}/echo-header", base));
        request.headers.insert("X-Probe".to_string(), "yes".to_string());
        request.body = Some("payload".to_string());

        let response = transport.send(&request, Duration::from_secs(5)).await.unwrap();
        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let base = spawn_server().await;
        let transport = ReqwestTransport::with_defaults().unwrap();
        let timeout = Duration::from_millis(100);

        let err = transport
            .send(&TransportRequest::new("GET", format!("{}/slow", base)), timeout)
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout(timeout));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::with_defaults().unwrap();
        let err = transport
            .send(
                &TransportRequest::new("GET", format!("http://{}/", addr)),
                Duration::from_secs(2),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_invalid_method_is_invalid_request() {
        let transport = ReqwestTransport::with_defaults().unwrap();
        let err = transport
            .send(
                &TransportRequest::new("NOT A METHOD", "http://127.0.0.1:9/"),
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }
}
