//! Online backups through SQLite's backup API.
//!
//! The copy is taken page by page from a live connection. If another
//! connection writes to the source mid-copy, SQLite restarts the backup, so
//! the destination holds a consistent snapshot once [`copy_database`]
//! returns. Busy or locked steps are retried a bounded number of times and
//! then reported as an engine error.

use std::ffi::c_int;
use std::path::Path;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use rusqlite::backup::{Backup, StepResult};
use rusqlite::ffi;
use tracing::debug;

use crate::connection::{open_or_create, open_read_only};
use crate::error::{GatewayError, Result};

const PAGES_PER_STEP: c_int = 100;
const STEP_PAUSE: Duration = Duration::from_millis(50);

/// Consecutive busy or locked steps tolerated before giving up.
const MAX_CONTENDED_STEPS: u32 = 20;

/// Copies `source` into `destination`, replacing its previous contents.
///
/// The caller must ensure the two paths name different files.
pub(crate) fn copy_database(source: &Path, destination: &Path) -> Result<()> {
    let src = open_read_only(source)?;
    let mut dst = open_or_create(destination)?;
    let backup = Backup::new(&src, &mut dst)?;
    run_steps(&backup, PAGES_PER_STEP, STEP_PAUSE)
}

/// Steps `backup` until it is done.
///
/// Each busy or locked step is retried after `pause`; after
/// [`MAX_CONTENDED_STEPS`] in a row the copy fails with that engine code.
fn run_steps(backup: &Backup<'_, '_>, pages: c_int, pause: Duration) -> Result<()> {
    let mut contended = 0;
    loop {
        let code = match backup.step(pages)? {
            StepResult::Done => return Ok(()),
            StepResult::More => {
                contended = 0;
                continue;
            }
            StepResult::Busy => ffi::SQLITE_BUSY,
            StepResult::Locked => ffi::SQLITE_LOCKED,
            #[allow(unreachable_patterns)]
            _ => ffi::SQLITE_BUSY,
        };
        contended += 1;
        if contended >= MAX_CONTENDED_STEPS {
            return Err(GatewayError::DatabaseError(rusqlite::Error::SqliteFailure(
                ffi::Error::new(code),
                Some(format!("backup gave up after {contended} contended steps")),
            )));
        }
        debug!(attempt = contended, "Backup step contended, retrying");
        thread::sleep(pause);
    }
}

/// File name for a backup of `source` taken at `now`:
/// `<stem>_backup_<YYYYMMDD_HHMMSS>.db`.
pub(crate) fn backup_file_name<Tz: TimeZone>(source: &Path, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}_backup_{}.db", now.format("%Y%m%d_%H%M%S"))
}
