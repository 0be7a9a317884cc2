//! Tallyman MCP Server
//!
//! Model Context Protocol server exposing filing fact extraction to AI
//! clients over stdio.
//!
//! Provides 4 MCP tools:
//! - `get_xbrl_concept` - Resolve one concept in one filing
//! - `get_xbrl_concepts` - Resolve a list of concepts (or the whole catalog)
//! - `discover_statement_concepts` - Resolve one statement family
//! - `discover_xbrl_concepts` - List every concept a filing reports
//!
//! # Example
//!
//! ```no_run
//! use tallyman_mcp::McpServer;
//!
//! let server = McpServer::from_env().unwrap();
//! server.run().unwrap();
//! ```

#![warn(missing_docs)]

mod error;
mod protocol;
mod server;
mod tools;

pub use error::McpError;
pub use protocol::{JsonRpcMessage, JsonRpcRequest};
pub use server::McpServer;
