//! Load-test execution engine for Stampede
//!
//! An [`ExecutionRegistry`] owns every active execution. Starting a test spawns
//! a controller task which runs one worker per virtual user until the
//! deadline or an explicit stop, then drains the workers, derives the final
//! [`TestResult`](stampede_core::TestResult) and hands it to the configured
//! [`ResultStore`](stampede_interfaces::ResultStore).

pub mod controller;
pub mod error;
pub mod execution;
pub mod executor;
pub mod metrics;
pub mod registry;
pub mod report;
pub mod selector;
pub mod store;
pub mod worker;

pub use error::EngineError;
pub use execution::Execution;
pub use executor::{RequestExecutor, RequestOutcome};
pub use metrics::{MetricsAggregator, MetricsSnapshot};
pub use registry::{ExecutionHandle, ExecutionRegistry};
pub use report::{build_report, generate_result, RunInfo};
pub use store::InMemoryResultStore;
pub use worker::{Worker, WorkerExit, WorkerStats};
