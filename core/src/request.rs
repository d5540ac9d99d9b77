//! Tool request parameters.
//!
//! Each struct mirrors the argument object of one tool. Optional fields
//! carry `serde` defaults so that callers may omit them entirely.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Database name used when a request does not specify one.
pub const DEFAULT_DATABASE: &str = "main.db";

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

/// Arguments for `execute_sql`.
///
/// # Examples
///
/// ```
/// use sqlite_mcp_core::QueryParams;
///
/// let params: QueryParams = serde_json::from_str(r#"{"query": "SELECT 1"}"#).unwrap();
/// assert_eq!(params.database, "main.db");
/// assert!(params.params.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParams {
    /// SQL statement to execute.
    pub query: String,
    /// Positional bind values.
    #[serde(default)]
    pub params: Option<Vec<Value>>,
    /// Database file name inside the sandbox.
    #[serde(default = "default_database")]
    pub database: String,
}

/// Arguments for `get_schema`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaParams {
    /// Database file name inside the sandbox.
    #[serde(default = "default_database")]
    pub database: String,
    /// Restricts the result to a single table.
    #[serde(default)]
    pub table_name: Option<String>,
}

impl Default for SchemaParams {
    fn default() -> Self {
        Self {
            database: default_database(),
            table_name: None,
        }
    }
}

/// Arguments for `backup_database`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupParams {
    /// Source database file name.
    pub source_db: String,
    /// Destination name inside the sandbox; generated when absent.
    #[serde(default)]
    pub backup_path: Option<String>,
}

/// Arguments for `create_table`.
///
/// `columns` keeps the caller's key order, which becomes the column
/// declaration order of the new table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTableParams {
    /// Database file name inside the sandbox.
    #[serde(default = "default_database")]
    pub database: String,
    /// Name of the table to create.
    pub table_name: String,
    /// Column name to declared type.
    pub columns: Map<String, Value>,
    /// Column that receives the `PRIMARY KEY` marker.
    #[serde(default)]
    pub primary_key: Option<String>,
}

/// Arguments for `optimize_database`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeParams {
    /// Database file name inside the sandbox.
    pub database: String,
}
