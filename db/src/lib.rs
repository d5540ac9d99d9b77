//! Sandbox directory management and configuration for the SQLite MCP server.
//!
//! This crate owns the two pieces of state shared by every tool call:
//!
//! - [`ServerConfig`] — data directory, row cap, and SQL allow-list, loaded
//!   from YAML.
//! - [`Sandbox`] — the canonical data directory, which resolves database
//!   names to paths that can never leave it and lists the databases it
//!   holds.
//!
//! # Quick start
//!
//! ```no_run
//! use sqlite_mcp_db::{Sandbox, ServerConfig};
//!
//! let config = ServerConfig::load("sqlite-mcp.yml").unwrap_or_default();
//! let sandbox = Sandbox::open(&config.data_dir).unwrap();
//!
//! for entry in sandbox.list_databases().unwrap() {
//!     println!("{} ({} bytes)", entry.name, entry.size_bytes);
//! }
//! ```

mod config;
mod error;
mod sandbox;

pub use config::{
    DEFAULT_ALLOWED_OPERATIONS, DEFAULT_DATA_DIR, DEFAULT_MAX_RESULTS, ServerConfig,
};
pub use error::{Result, SandboxError};
pub use sandbox::{DATABASE_EXTENSION, Sandbox};
