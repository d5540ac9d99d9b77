//! Statement gateway and schema inspector for sandboxed SQLite databases.
//!
//! This crate is the engine-facing half of the SQLite MCP server. A
//! [`Gateway`] turns tool requests into SQLite calls and every result,
//! including engine and filesystem faults, into a structured
//! [`Outcome`](sqlite_mcp_core::Outcome).
//!
//! # Architecture
//!
//! - **`gateway`** — allow-list check, statement execution, table creation,
//!   backups, listing, and maintenance
//! - **`inspect`** — tables, columns, indexes, and row counts
//! - **`backup`** — online copies through SQLite's backup API
//! - **`connection`** — per-call connection scopes
//! - **`convert`** — JSON ↔ SQLite value mapping
//!
//! # Quick start
//!
//! ```no_run
//! use sqlite_mcp_core::ToResponse;
//! use sqlite_mcp_db::ServerConfig;
//! use sqlite_mcp_sqlite::Gateway;
//!
//! let gateway = Gateway::new(ServerConfig::default()).unwrap();
//! let schema = gateway.get_schema("main.db", None);
//! println!("{}", schema.to_response());
//! ```
//!
//! # Concurrency
//!
//! A [`Gateway`] holds no connections. Concurrent calls against the same
//! file are serialized only by SQLite's own locking; a call that meets a
//! conflicting lock fails immediately with a `DatabaseBusy` engine error.

mod backup;
mod connection;
mod convert;
mod error;
mod gateway;
mod inspect;

pub use error::{GatewayError, Result};
pub use gateway::{Gateway, MAINTENANCE_STATEMENTS, leading_keyword};
