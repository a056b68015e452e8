//! # Stampede Interfaces
//!
//! Traits for the collaborators the execution engine depends on but does not
//! implement: the HTTP transport that issues requests, the store that
//! persists final results, and the permission service callers consult before
//! invoking the engine.
//!
//! ## Main Interfaces
//!
//! - [`Transport`] - send one request with a timeout, report status or error
//! - [`ResultStore`] - persist and fetch final test results
//! - [`PermissionChecker`] - authorization for the outer query surface

pub mod permission;
pub mod persistence;
pub mod transport;

// Re-export commonly used types
pub use permission::{require_permission, EngineOperation, Permission, PermissionChecker, PermissionError};
pub use persistence::{PersistenceError, ResultStore};
pub use transport::{Transport, TransportError, TransportRequest, TransportResponse};
