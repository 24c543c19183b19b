//! Test utilities for MCP Runtime
//!
//! This crate provides common test fixtures and utilities to reduce duplication
//! across test files in the MCP Runtime ecosystem.

pub mod assertions;
pub mod fixtures;
pub mod mocks;

pub use assertions::*;
pub use fixtures::*;
pub use mocks::*;
