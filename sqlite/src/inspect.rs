//! Schema introspection.
//!
//! Reads table, column, and index metadata through SQLite's pragma
//! table-valued functions, so table and index names are bound as
//! parameters rather than spliced into SQL. Only the row count query needs
//! a quoted identifier.

use rusqlite::{Connection, params};
use sqlite_mcp_core::{ColumnDescriptor, IndexDescriptor, SchemaDescriptor, TableDescriptor};

use crate::convert::quote_identifier;
use crate::error::Result;

/// Internal table SQLite uses to track `AUTOINCREMENT` counters.
const SEQUENCE_TABLE: &str = "sqlite_sequence";

/// Placeholder name for index keys that are expressions rather than columns.
const EXPRESSION_KEY: &str = "<expression>";

/// Describes every user table, or only `table` when given.
///
/// An unknown `table` yields an empty table map rather than an error.
pub(crate) fn read_schema(
    conn: &Connection,
    database: &str,
    table: Option<&str>,
) -> Result<SchemaDescriptor> {
    let mut schema = SchemaDescriptor::new(database);
    for name in table_names(conn, table)? {
        let descriptor = describe_table(conn, &name)?;
        schema.tables.insert(name, descriptor);
    }
    Ok(schema)
}

fn table_names(conn: &Connection, table: Option<&str>) -> Result<Vec<String>> {
    let names = match table {
        Some(table) => {
            let mut stmt =
                conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
            let names = stmt
                .query_map(params![table], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            names
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name != ?1 ORDER BY name",
            )?;
            let names = stmt
                .query_map(params![SEQUENCE_TABLE], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            names
        }
    };
    Ok(names)
}

fn describe_table(conn: &Connection, table: &str) -> Result<TableDescriptor> {
    Ok(TableDescriptor {
        columns: columns(conn, table)?,
        indexes: indexes(conn, table)?,
        row_count: row_count(conn, table)?,
    })
}

/// Columns in declaration order.
fn columns(conn: &Connection, table: &str) -> Result<Vec<ColumnDescriptor>> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let columns = stmt
        .query_map(params![table], |row| {
            Ok(ColumnDescriptor {
                name: row.get(0)?,
                declared_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                default_value: row.get(3)?,
                // pk is the 1-based position within the primary key, 0 otherwise.
                primary_key: row.get::<_, i64>(4)? != 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn indexes(conn: &Connection, table: &str) -> Result<Vec<IndexDescriptor>> {
    let mut stmt =
        conn.prepare("SELECT name, \"unique\" FROM pragma_index_list(?1) ORDER BY seq")?;
    let listed = stmt
        .query_map(params![table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut indexes = Vec::with_capacity(listed.len());
    for (name, unique) in listed {
        let columns = index_columns(conn, &name)?;
        indexes.push(IndexDescriptor {
            name,
            unique,
            columns,
        });
    }
    Ok(indexes)
}

/// Key columns of an index in key order.
fn index_columns(conn: &Connection, index: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
    let columns = stmt
        .query_map(params![index], |row| row.get::<_, Option<String>>(0))?
        .map(|name| name.map(|n| n.unwrap_or_else(|| EXPRESSION_KEY.to_string())))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn row_count(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or_default())
}
