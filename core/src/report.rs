//! Success payloads for each tool.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::outcome::{Outcome, Report, ToResponse};

/// One result row keyed by column name, in column order.
pub type Row = Map<String, Value>;

/// Rows returned by a `SELECT`, capped at the configured maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    /// At most `max_results` rows.
    pub data: Vec<Row>,
    /// True number of rows produced by the statement.
    pub row_count: u64,
    /// `true` when `row_count` exceeds the number of rows in `data`.
    pub truncated: bool,
}

/// Confirmation of a statement that does not return rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub message: String,
    pub rows_affected: u64,
}

impl WriteSummary {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            message: format!("Query executed successfully. Rows affected: {rows_affected}"),
            rows_affected,
        }
    }
}

/// Successful execution of a statement.
///
/// Exactly one of the two shapes is produced: rows for `SELECT`, a write
/// summary for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Execution {
    Rows(RowSet),
    Written(WriteSummary),
}

impl Report for Execution {}

/// Result of running a statement through the gateway.
pub type ExecutionResult = Outcome<Execution>;

/// Column of a table, as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type; empty when the column was declared without one.
    #[serde(rename = "type")]
    pub declared_type: String,
    pub not_null: bool,
    /// Default value expression as written in the DDL.
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Index on a table, with its key columns in key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

/// Structure and size of a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub row_count: u64,
}

/// Schema of a database, keyed by table name.
///
/// # Examples
///
/// ```
/// use sqlite_mcp_core::SchemaDescriptor;
///
/// let schema = SchemaDescriptor::new("main.db");
/// assert!(schema.tables.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub database: String,
    pub tables: BTreeMap<String, TableDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            tables: BTreeMap::new(),
        }
    }
}

impl Report for SchemaDescriptor {}

/// Completed backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupReport {
    pub message: String,
    /// Path of the written backup file.
    pub backup_path: String,
    pub timestamp: String,
}

impl Report for BackupReport {}

/// A database file found in the sandbox directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub name: String,
    pub size_bytes: u64,
    /// Last modification time, RFC 3339.
    pub modified: String,
    pub path: String,
}

/// Listing of the sandbox directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseList {
    pub databases: Vec<DatabaseEntry>,
    pub count: usize,
}

impl DatabaseList {
    pub fn new(databases: Vec<DatabaseEntry>) -> Self {
        let count = databases.len();
        Self { databases, count }
    }
}

impl Report for DatabaseList {}

/// One maintenance statement run by `optimize_database`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceStep {
    pub operation: String,
    #[serde(serialize_with = "serialize_outcome")]
    pub result: ExecutionResult,
}

fn serialize_outcome<S: Serializer>(outcome: &ExecutionResult, serializer: S) -> Result<S::Ok, S::Error> {
    outcome.to_response().serialize(serializer)
}

/// Outcome of `optimize_database`.
///
/// Successful only when every step succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeReport {
    pub message: String,
    pub operations: Vec<MaintenanceStep>,
    pub timestamp: String,
}

impl OptimizeReport {
    pub fn all_succeeded(&self) -> bool {
        self.operations.iter().all(|step| step.result.is_ok())
    }
}

impl Report for OptimizeReport {
    fn is_success(&self) -> bool {
        self.all_succeeded()
    }
}
