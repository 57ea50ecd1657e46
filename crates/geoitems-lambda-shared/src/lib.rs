//! Shared infrastructure for the geo items AWS Lambda functions.
//!
//! This crate provides common functionality used across all Lambda handlers:
//!
//! - [`LambdaRuntime`]: the [`ItemService`](geoitems_lib::ItemService) built once per process
//! - [`Config`]: environment configuration read at cold start
//! - [`init_tracing`]: JSON-formatted tracing for CloudWatch Logs
//! - [`ProblemDetails`]: RFC 9457 Problem Details for consistent error responses
//! - [`ProxyRequest`] / [`ProxyResponse`]: API Gateway proxy integration shapes
//! - Request types with validation for each Lambda endpoint
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides an in-memory runtime and event builders
//! for Lambda handler testing. Enable the `test-utils` feature to access it
//! from dependent crates.

#![deny(warnings)]

mod config;
mod problem;
mod requests;
mod response;
mod runtime;
mod tracing_init;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_GEOCODE_FAILED, PROBLEM_INTERNAL_ERROR,
    PROBLEM_INVALID_REQUEST, PROBLEM_ITEM_NOT_FOUND,
};
pub use requests::{
    ItemRequest, ProxyRequest, SearchRequest, Validate, MISSING_ITEM_FIELDS, MISSING_SEARCH_CENTER,
};
pub use response::ProxyResponse;
pub use runtime::{InitError, LambdaRuntime};
pub use tracing_init::init_tracing;
