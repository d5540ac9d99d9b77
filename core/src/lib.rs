//! Shared types for the SQLite MCP server.
//!
//! This crate defines the values that cross the tool boundary:
//!
//! - request parameters ([`QueryParams`], [`SchemaParams`],
//!   [`CreateTableParams`], [`BackupParams`], [`OptimizeParams`]);
//! - success payloads ([`Execution`], [`SchemaDescriptor`],
//!   [`BackupReport`], [`DatabaseList`], [`OptimizeReport`]);
//! - the failure taxonomy ([`ErrorCategory`], [`Failure`]).
//!
//! Every operation yields an [`Outcome<T>`], which [`ToResponse`] flattens
//! into the `{ "success": bool, ... }` object sent back to callers.
//!
//! # Example
//!
//! ```
//! use sqlite_mcp_core::*;
//!
//! let ok: ExecutionResult = Ok(Execution::Written(WriteSummary::new(1)));
//! assert_eq!(ok.to_response()["rows_affected"], 1);
//!
//! let denied: ExecutionResult = Err(Failure::new(
//!     ErrorCategory::OperationNotAllowed,
//!     "Operation PRAGMA not allowed",
//! ));
//! assert_eq!(denied.to_response()["success"], false);
//! ```

mod outcome;
mod report;
mod request;

pub use outcome::{ErrorCategory, Failure, Outcome, Report, ToResponse, annotate, timestamp};
pub use report::{
    BackupReport, ColumnDescriptor, DatabaseEntry, DatabaseList, Execution, ExecutionResult,
    IndexDescriptor, MaintenanceStep, OptimizeReport, Row, RowSet, SchemaDescriptor,
    TableDescriptor, WriteSummary,
};
pub use request::{
    BackupParams, CreateTableParams, DEFAULT_DATABASE, OptimizeParams, QueryParams, SchemaParams,
};
