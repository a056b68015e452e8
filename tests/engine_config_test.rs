//! Engine wiring driven by configuration loaded from the environment

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use stampede_config::domains::logging::LogFormat;
use stampede_config::{ConfigLoader, StampedeConfig};
use stampede_core::{ExecutionStatus, Scenario, TestDefinition, TestId};
use stampede_execution::{EngineError, ExecutionRegistry, InMemoryResultStore};
use stampede_http::ReqwestTransport;
use stampede_logging::init_logging_from_config;

async fn start_slow_server() -> Result<SocketAddr> {
    let app = Router::new()
        .route("/fast", get(|| async { "fast" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "slow"
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(addr)
}

fn load_config(vars: &[(&str, &str)]) -> Result<StampedeConfig> {
    let vars: Vec<(&str, Option<&str>)> = vars.iter().map(|(k, v)| (*k, Some(*v))).collect();
    Ok(temp_env::with_vars(vars, || ConfigLoader::new().from_env())?)
}

fn registry_from(config: &StampedeConfig) -> Result<ExecutionRegistry> {
    let transport = ReqwestTransport::new(&config.http)?;
    Ok(ExecutionRegistry::new(
        Arc::new(transport),
        Arc::new(InMemoryResultStore::new()),
        config.engine.clone(),
    ))
}

fn definition(id: i64, url: String) -> TestDefinition {
    TestDefinition::new(TestId(id), "configured", 2, 1, vec![Scenario::new("GET", url)])
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_logging_and_transport_from_config() -> Result<()> {
    let config = load_config(&[
        ("STAMPEDE_LOG_FORMAT", "json"),
        ("STAMPEDE_LOG_LEVEL", "warn"),
        ("STAMPEDE_HTTP_USER_AGENT", "stampede-e2e"),
    ])?;
    assert_eq!(config.logging.format, LogFormat::Json);
    init_logging_from_config(&config.logging)?;

    let addr = start_slow_server().await?;
    let registry = registry_from(&config)?;
    let result = registry
        .start(definition(1, format!("http://{}/fast", addr)))?
        .wait()
        .await?;

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.error_rate, 0.0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_active_execution_limit_from_env() -> Result<()> {
    let config = load_config(&[("STAMPEDE_MAX_ACTIVE_EXECUTIONS", "1")])?;
    let addr = start_slow_server().await?;
    let registry = registry_from(&config)?;

    let first = registry.start(definition(2, format!("http://{}/fast", addr)))?;
    let err = registry
        .start(definition(3, format!("http://{}/fast", addr)))
        .unwrap_err();
    assert!(matches!(err, EngineError::CapacityExhausted { limit: 1 }));

    first.wait().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_default_request_timeout_from_env() -> Result<()> {
    let config = load_config(&[
        ("STAMPEDE_REQUEST_TIMEOUT", "1"),
        ("STAMPEDE_DRAIN_GRACE_MS", "200"),
    ])?;
    let addr = start_slow_server().await?;
    let registry = registry_from(&config)?;

    // the slow endpoint answers after 3s, so every request hits the 1s default
    let mut definition = definition(4, format!("http://{}/slow", addr));
    definition.duration_seconds = 3;
    let result = registry.start(definition)?.wait().await?;

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert!(result.total_requests > 0);
    assert_eq!(result.error_rate, 100.0);
    assert_eq!(
        result.error_distribution.get("request timed out after 1s").copied(),
        Some(result.total_requests)
    );
    Ok(())
}
