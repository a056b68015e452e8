//! Core domain models and types for Stampede
//!
//! This crate contains the fundamental types used throughout the load-test
//! engine: test definitions and their scenarios, execution status, derived
//! results and the definition validator. It has minimal dependencies and
//! defines the domain language of the application.

pub mod definition;
pub mod error;
pub mod execution;
pub mod result;
pub mod serde_millis;
pub mod validation;

// Re-export commonly used types at the crate root
pub use definition::{Scenario, TestDefinition, TestId};
pub use error::ValidationError;
pub use execution::{CancelReason, ExecutionStatus};
pub use result::{LoadTestReport, TestResult};
pub use validation::{validate_definition, MAX_CONCURRENT_USERS, MAX_DURATION_SECONDS};
