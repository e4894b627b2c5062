//! MCP server for gadget search
//!
//! Loads the engine once and serves searches over stdio.

mod server;

pub use server::run_mcp_server;
