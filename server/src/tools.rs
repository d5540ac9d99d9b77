//! Tool registry and dispatch.
//!
//! Each tool deserializes its arguments into a request type from
//! `sqlite-mcp-core`, runs the matching [`Gateway`] operation, and returns
//! the flattened `{ "success": bool, ... }` response.

use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sqlite_mcp_core::{
    BackupParams, CreateTableParams, OptimizeParams, QueryParams, SchemaParams, ToResponse,
    annotate, timestamp,
};
use sqlite_mcp_sqlite::Gateway;
use tracing::info;

use crate::error::{Result, ServerError};

/// Longest query prefix written to the log.
const LOGGED_QUERY_CHARS: usize = 100;

/// Tools exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    ExecuteSql,
    GetSchema,
    CreateTable,
    BackupDatabase,
    ListDatabases,
    OptimizeDatabase,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::ExecuteSql,
        Tool::GetSchema,
        Tool::CreateTable,
        Tool::BackupDatabase,
        Tool::ListDatabases,
        Tool::OptimizeDatabase,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::ExecuteSql => "execute_sql",
            Tool::GetSchema => "get_schema",
            Tool::CreateTable => "create_table",
            Tool::BackupDatabase => "backup_database",
            Tool::ListDatabases => "list_databases",
            Tool::OptimizeDatabase => "optimize_database",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Tool::ExecuteSql => {
                "Execute a SQL query on the specified SQLite database. Supports SELECT, INSERT, \
                 UPDATE, DELETE, CREATE, DROP, and ALTER operations. Use parameters for safe \
                 query execution to prevent SQL injection."
            }
            Tool::GetSchema => {
                "Get database schema information including tables, columns, and indexes."
            }
            Tool::CreateTable => "Create a new table with specified columns and constraints.",
            Tool::BackupDatabase => "Create a backup copy of a SQLite database.",
            Tool::ListDatabases => "List all available SQLite databases in the data directory.",
            Tool::OptimizeDatabase => {
                "Optimize database by running VACUUM and ANALYZE commands."
            }
        }
    }

    /// JSON Schema of the tool's arguments.
    fn input_schema(&self) -> Value {
        match self {
            Tool::ExecuteSql => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "SQL query to execute"},
                    "params": {"type": "array", "description": "Query parameters"},
                    "database": {"type": "string", "description": "Database file name", "default": "main.db"}
                },
                "required": ["query"]
            }),
            Tool::GetSchema => json!({
                "type": "object",
                "properties": {
                    "database": {"type": "string", "description": "Database file name", "default": "main.db"},
                    "table_name": {"type": "string", "description": "Specific table name"}
                }
            }),
            Tool::CreateTable => json!({
                "type": "object",
                "properties": {
                    "database": {"type": "string", "description": "Database file name", "default": "main.db"},
                    "table_name": {"type": "string", "description": "Name of the table to create"},
                    "columns": {
                        "type": "object",
                        "description": "Column definitions (name: type)",
                        "additionalProperties": {"type": "string"}
                    },
                    "primary_key": {"type": "string", "description": "Primary key column"}
                },
                "required": ["table_name", "columns"]
            }),
            Tool::BackupDatabase => json!({
                "type": "object",
                "properties": {
                    "source_db": {"type": "string", "description": "Source database file"},
                    "backup_path": {"type": "string", "description": "Backup file path"}
                },
                "required": ["source_db"]
            }),
            Tool::ListDatabases => json!({"type": "object", "properties": {}}),
            Tool::OptimizeDatabase => json!({
                "type": "object",
                "properties": {
                    "database": {"type": "string", "description": "Database file name"}
                },
                "required": ["database"]
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

impl FromStr for Tool {
    type Err = ServerError;

    fn from_str(name: &str) -> Result<Self> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| ServerError::UnknownTool(name.to_string()))
    }
}

/// Entry of the `tools/list` response.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Runs tools against a [`Gateway`].
#[derive(Debug, Clone)]
pub struct ToolHandler {
    gateway: Gateway,
}

impl ToolHandler {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        Tool::ALL.iter().map(Tool::definition).collect()
    }

    /// Runs the named tool and returns its flattened response.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::UnknownTool`] or
    /// [`ServerError::InvalidArguments`]; failures of the operation itself
    /// are reported inside the returned value.
    pub fn call(&self, name: &str, arguments: Value) -> Result<Value> {
        let tool: Tool = name.parse()?;
        let response = match tool {
            Tool::ExecuteSql => {
                let params: QueryParams = parse_arguments(tool, arguments)?;
                info!(
                    database = %params.database,
                    query = %preview(&params.query),
                    "Executing SQL query"
                );
                let binds = params.params.as_deref().unwrap_or_default();
                let result = self.gateway.execute(&params.database, &params.query, binds);
                annotate(
                    result.to_response(),
                    [
                        ("database", json!(params.database)),
                        ("timestamp", json!(timestamp())),
                    ],
                )
            }
            Tool::GetSchema => {
                let params: SchemaParams = parse_arguments(tool, arguments)?;
                info!(database = %params.database, "Getting schema");
                self.gateway
                    .get_schema(&params.database, params.table_name.as_deref())
                    .to_response()
            }
            Tool::CreateTable => {
                let params: CreateTableParams = parse_arguments(tool, arguments)?;
                info!(database = %params.database, table = %params.table_name, "Creating table");
                self.gateway.create_table(&params).to_response()
            }
            Tool::BackupDatabase => {
                let params: BackupParams = parse_arguments(tool, arguments)?;
                info!(database = %params.source_db, "Backing up database");
                self.gateway
                    .backup(&params.source_db, params.backup_path.as_deref())
                    .to_response()
            }
            Tool::ListDatabases => {
                info!("Listing available databases");
                self.gateway.list_databases().to_response()
            }
            Tool::OptimizeDatabase => {
                let params: OptimizeParams = parse_arguments(tool, arguments)?;
                info!(database = %params.database, "Optimizing database");
                self.gateway.optimize(&params.database).to_response()
            }
        };
        Ok(response)
    }
}

/// Deserializes tool arguments; a missing argument object counts as `{}`.
fn parse_arguments<T: DeserializeOwned>(tool: Tool, arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|source| ServerError::InvalidArguments {
        tool: tool.name().to_string(),
        source,
    })
}

fn preview(query: &str) -> String {
    let mut chars = query.chars();
    let head: String = chars.by_ref().take(LOGGED_QUERY_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
