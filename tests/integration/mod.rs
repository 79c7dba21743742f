//! Integration test suite for AWD
//!
//! End-to-end tests that run the `awd` binary against temporary projects.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **compile**: `awd compile` output, flags, configuration and failure modes
//! - **validate**: `awd validate` reports and exit codes
//! - **list**: `awd list` grouping, filtering and JSON output

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod compile;
mod list;
mod validate;
