//! Per-call connection scopes.
//!
//! Each tool call opens its own [`Connection`] and drops it before
//! returning; dropping closes it on every exit path. Busy handling is
//! disabled, so lock contention surfaces immediately as `DatabaseBusy`.
//!
//! Reads go through [`open_read_only`], so a database file without write
//! permission can still be queried and inspected.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use crate::error::Result;

/// Opens a database that must already exist, for reading and writing.
///
/// The file is never created, even if it disappears between the caller's
/// existence check and this call.
pub(crate) fn open_existing(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    configure(Connection::open_with_flags(path, flags)?)
}

/// Opens an existing database for reading only.
pub(crate) fn open_read_only(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    configure(Connection::open_with_flags(path, flags)?)
}

/// Opens a database, creating the file if it does not exist.
pub(crate) fn open_or_create(path: &Path) -> Result<Connection> {
    configure(Connection::open(path)?)
}

fn configure(conn: Connection) -> Result<Connection> {
    conn.busy_timeout(Duration::ZERO)?;
    Ok(conn)
}
