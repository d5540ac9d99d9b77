//! The statement gateway: every tool operation over sandboxed databases.
//!
//! [`Gateway`] resolves database names through the [`Sandbox`], opens one
//! connection per call, and turns every outcome into an [`Outcome`]. Engine
//! and filesystem faults never escape as errors; they come back as
//! [`Failure`] values with an [`ErrorCategory`](sqlite_mcp_core::ErrorCategory).
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use sqlite_mcp_db::ServerConfig;
//! use sqlite_mcp_sqlite::Gateway;
//! use sqlite_mcp_core::ToResponse;
//!
//! let gateway = Gateway::new(ServerConfig::default()).unwrap();
//! gateway
//!     .execute("main.db", "CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", &[])
//!     .unwrap();
//! gateway
//!     .execute("main.db", "INSERT INTO t (v) VALUES (?)", &[json!("x")])
//!     .unwrap();
//!
//! let rows = gateway.execute("main.db", "SELECT * FROM t", &[]);
//! println!("{}", rows.to_response());
//! ```

use std::io;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params_from_iter};
use serde_json::Value;
use sqlite_mcp_core::{
    BackupReport, CreateTableParams, DatabaseList, Execution, ExecutionResult, Failure,
    MaintenanceStep, OptimizeReport, Outcome, Row, RowSet, SchemaDescriptor, WriteSummary,
    timestamp,
};
use sqlite_mcp_db::{Sandbox, ServerConfig};
use tracing::{debug, warn};

use crate::backup;
use crate::connection::{open_existing, open_or_create, open_read_only};
use crate::convert::{json_to_sql, sql_to_json};
use crate::error::{GatewayError, Result};
use crate::inspect;

/// The only leading keyword that returns rows.
const SELECT: &str = "SELECT";

/// Statements run by [`Gateway::optimize`], in order.
pub const MAINTENANCE_STATEMENTS: [&str; 2] = ["VACUUM", "ANALYZE"];

/// Executes tool operations against databases in one sandbox directory.
///
/// Holds no connections: each method opens what it needs and drops it
/// before returning, so a `Gateway` can be shared freely.
#[derive(Debug, Clone)]
pub struct Gateway {
    sandbox: Sandbox,
    config: ServerConfig,
}

impl Gateway {
    /// Opens (and creates if needed) the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SandboxError`] if the directory cannot be
    /// created or canonicalized.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let sandbox = Sandbox::open(&config.data_dir)?;
        Ok(Self { sandbox, config })
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Executes one SQL statement with optional positional bind values.
    ///
    /// The first whitespace-delimited token, upper-cased, must be in the
    /// allow-list; otherwise the call fails with `OperationNotAllowed`
    /// before any connection is opened.
    ///
    /// A `SELECT` requires the database to exist and returns at most
    /// `max_results` rows alongside the true row count. Any other statement
    /// runs in autocommit mode, so its effect is durable once this returns.
    pub fn execute(&self, database: &str, sql: &str, binds: &[Value]) -> ExecutionResult {
        self.try_execute(database, sql, binds)
            .map_err(|err| failure(database, err))
    }

    fn try_execute(&self, database: &str, sql: &str, binds: &[Value]) -> Result<Execution> {
        let keyword = self.check_operation(sql)?;
        debug!(database, keyword = %keyword, "Executing statement");

        if keyword == SELECT {
            let path = self.existing(database)?;
            let conn = open_read_only(&path)?;
            query_rows(&conn, sql, binds, self.config.max_results)
        } else {
            let path = self.sandbox.resolve(database)?;
            let conn = open_or_create(&path)?;
            execute_statement(&conn, sql, binds)
        }
    }

    /// Returns the upper-cased leading keyword if it is allowed.
    fn check_operation(&self, sql: &str) -> Result<String> {
        let Some(keyword) = leading_keyword(sql) else {
            return Err(GatewayError::OperationNotAllowed("(empty statement)".to_string()));
        };
        if !self.config.is_allowed(&keyword) {
            return Err(GatewayError::OperationNotAllowed(keyword));
        }
        Ok(keyword)
    }

    /// Creates a table from `(name, type)` column pairs.
    ///
    /// Builds `CREATE TABLE IF NOT EXISTS` with the columns in the caller's
    /// order, marking `primary_key` if named, and runs it through
    /// [`execute`](Self::execute). Identifiers and types are not validated;
    /// the engine rejects anything malformed.
    pub fn create_table(&self, params: &CreateTableParams) -> ExecutionResult {
        let sql = create_table_sql(params);
        self.execute(&params.database, &sql, &[])
    }

    /// Describes the tables of an existing database.
    ///
    /// With `table` set, only that table is described; if it does not exist
    /// the table map is empty.
    pub fn get_schema(&self, database: &str, table: Option<&str>) -> Outcome<SchemaDescriptor> {
        self.try_get_schema(database, table)
            .map_err(|err| failure(database, err))
    }

    fn try_get_schema(&self, database: &str, table: Option<&str>) -> Result<SchemaDescriptor> {
        let path = self.existing(database)?;
        let conn = open_read_only(&path)?;
        inspect::read_schema(&conn, database, table)
    }

    /// Takes a consistent online copy of an existing database.
    ///
    /// Without a destination the backup is written to the data directory as
    /// `<stem>_backup_<YYYYMMDD_HHMMSS>.db`. A named destination is resolved
    /// through the sandbox like any database name; its directory must
    /// already exist.
    pub fn backup(&self, source: &str, destination: Option<&str>) -> Outcome<BackupReport> {
        self.try_backup(source, destination)
            .map_err(|err| failure(source, err))
    }

    fn try_backup(&self, source: &str, destination: Option<&str>) -> Result<BackupReport> {
        let source_path = self.sandbox.resolve(source)?;
        if !source_path.is_file() {
            return Err(GatewayError::NotFound(format!(
                "Source database {source} does not exist"
            )));
        }

        let destination_path = match destination {
            Some(name) => self.sandbox.resolve(name)?,
            None => self.sandbox.root().join(backup::backup_file_name(
                &source_path,
                &chrono::Local::now(),
            )),
        };
        ensure_parent_dir(&destination_path)?;
        ensure_distinct(&source_path, &destination_path)?;

        backup::copy_database(&source_path, &destination_path)?;
        Ok(BackupReport {
            message: "Database backed up successfully".to_string(),
            backup_path: destination_path.display().to_string(),
            timestamp: timestamp(),
        })
    }

    /// Lists the `*.db` files in the data directory.
    pub fn list_databases(&self) -> Outcome<DatabaseList> {
        self.sandbox
            .list_databases()
            .map(DatabaseList::new)
            .map_err(|err| failure("<data directory>", err.into()))
    }

    /// Runs `VACUUM` then `ANALYZE` on an existing database.
    ///
    /// Both steps always run; the report is successful only if both
    /// succeeded.
    pub fn optimize(&self, database: &str) -> Outcome<OptimizeReport> {
        let path = self
            .existing(database)
            .map_err(|err| failure(database, err))?;

        let operations = MAINTENANCE_STATEMENTS
            .iter()
            .map(|statement| MaintenanceStep {
                operation: statement.to_string(),
                result: run_maintenance(&path, statement).map_err(|err| failure(database, err)),
            })
            .collect();

        Ok(OptimizeReport {
            message: "Database optimization completed".to_string(),
            operations,
            timestamp: timestamp(),
        })
    }

    /// Resolves a database name and requires the file to exist.
    fn existing(&self, database: &str) -> Result<PathBuf> {
        let path = self.sandbox.resolve(database)?;
        if !path.is_file() {
            return Err(GatewayError::NotFound(format!(
                "Database {database} does not exist"
            )));
        }
        Ok(path)
    }
}

/// First whitespace-delimited token of `sql`, upper-cased.
///
/// # Examples
///
/// ```
/// use sqlite_mcp_sqlite::leading_keyword;
///
/// assert_eq!(leading_keyword("  select * from t").as_deref(), Some("SELECT"));
/// assert_eq!(leading_keyword("   "), None);
/// ```
pub fn leading_keyword(sql: &str) -> Option<String> {
    sql.split_whitespace().next().map(str::to_uppercase)
}

fn create_table_sql(params: &CreateTableParams) -> String {
    let definitions: Vec<String> = params
        .columns
        .iter()
        .map(|(name, declared)| {
            let declared = match declared {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let mut definition = format!("{name} {declared}");
            if params.primary_key.as_deref() == Some(name.as_str()) {
                definition.push_str(" PRIMARY KEY");
            }
            definition
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        params.table_name,
        definitions.join(", ")
    )
}

/// Steps every row but keeps only the first `cap`.
fn query_rows(conn: &Connection, sql: &str, binds: &[Value], cap: usize) -> Result<Execution> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(params_from_iter(binds.iter().map(json_to_sql)))?;
    let mut data = Vec::new();
    let mut row_count: u64 = 0;
    while let Some(row) = rows.next()? {
        row_count += 1;
        if data.len() < cap {
            let mut record = Row::new();
            for (idx, name) in columns.iter().enumerate() {
                record.insert(name.clone(), sql_to_json(row.get_ref(idx)?));
            }
            data.push(record);
        }
    }

    let truncated = row_count > data.len() as u64;
    Ok(Execution::Rows(RowSet {
        data,
        row_count,
        truncated,
    }))
}

/// Runs a non-`SELECT` statement to completion and reports the change count.
///
/// Rows produced by `RETURNING` clauses are stepped through and discarded.
fn execute_statement(conn: &Connection, sql: &str, binds: &[Value]) -> Result<Execution> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(binds.iter().map(json_to_sql)))?;
    while rows.next()?.is_some() {}
    drop(rows);

    let rows_affected = u64::try_from(conn.changes()).unwrap_or_default();
    Ok(Execution::Written(WriteSummary::new(rows_affected)))
}

fn run_maintenance(path: &Path, statement: &str) -> Result<Execution> {
    let conn = open_existing(path)?;
    execute_statement(&conn, statement, &[])
}

/// Fails with `IOError` if the backup destination names the source file.
fn ensure_distinct(source: &Path, destination: &Path) -> Result<()> {
    let same = match (source.canonicalize(), destination.canonicalize()) {
        (Ok(source), Ok(destination)) => source == destination,
        _ => source == destination,
    };
    if same {
        return Err(GatewayError::IoError(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "backup destination {} is the source database",
                destination.display()
            ),
        )));
    }
    Ok(())
}

/// Fails with `IOError` if the backup destination's directory is missing.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.is_dir() => Err(GatewayError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            format!("backup directory {} does not exist", parent.display()),
        ))),
        _ => Ok(()),
    }
}

fn failure(database: &str, err: GatewayError) -> Failure {
    let failure = Failure::from(err);
    warn!(database, category = %failure.category, error = %failure.message, "Operation failed");
    failure
}
