//! Integration test suite for MCP Runtime
//!
//! This crate contains comprehensive integration tests for the MCP Runtime implementation.

fn main() {
    // This is a test-only crate, so main() is not used
    // Tests are run via `cargo test`
    println!("Integration test suite for MCP Runtime");
}
