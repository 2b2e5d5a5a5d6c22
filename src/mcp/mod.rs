//! MCP server for job search
//!
//! Exposes keyword search, semantic search and posting lookup as tools over stdio.

mod server;

pub use server::run_mcp_server;
