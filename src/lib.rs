//! Workspace root package.
//!
//! Holds workspace-level tooling only (the rusty-hook pre-commit checks).
//! The library lives in `crates/geoitems-lib` and each Lambda in its own
//! `crates/geoitems-lambda-*` crate.
