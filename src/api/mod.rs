//! REST gateway module for the event-registration platform.
//!
//! This module provides the `ApiClient` for issuing typed requests and
//! the `ApiError` taxonomy every failure is normalized into: transport
//! problems, server errors, and batched spreadsheet validation failures.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, RowError, ValidationBatch};
