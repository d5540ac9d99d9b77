//! Model Context Protocol server for sandboxed SQLite databases.
//!
//! The server speaks newline-delimited JSON-RPC 2.0 on a reader/writer pair
//! (stdin/stdout in the `sqlite-mcp` binary) and exposes:
//!
//! - six tools backed by [`sqlite_mcp_sqlite::Gateway`]
//! - two prompt templates
//! - three markdown reference documents
//!
//! # Example
//!
//! ```no_run
//! use std::io;
//!
//! use sqlite_mcp_db::ServerConfig;
//! use sqlite_mcp_server::McpServer;
//!
//! let server = McpServer::new(ServerConfig::default()).unwrap();
//! server.run(io::stdin().lock(), io::stdout().lock()).unwrap();
//! ```

mod error;
pub mod prompts;
pub mod protocol;
pub mod resources;
mod server;
pub mod tools;

pub use error::{Result, ServerError};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::{McpServer, SERVER_NAME};
pub use tools::{Tool, ToolDefinition, ToolHandler};
