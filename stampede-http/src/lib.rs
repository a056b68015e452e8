//! HTTP transport for Stampede
//!
//! [`ReqwestTransport`] implements the engine's `Transport` trait on top of a
//! single pooled `reqwest::Client` that is shared by every worker.

pub mod client;
pub mod errors;

pub use client::ReqwestTransport;
pub use errors::HttpError;
