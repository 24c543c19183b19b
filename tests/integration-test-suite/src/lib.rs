//! Integration test suite for MCP Runtime
//!
//! This crate contains comprehensive integration tests for the MCP Runtime implementation.

pub mod cancellation_tests;
pub mod client_integration_tests;
pub mod completion_tests;
pub mod http_integration_tests;
pub mod integration_tests;
pub mod mcp_compliance_tests;
pub mod test_ergonomic_api;
