//! `SQLite` connection setup: DSN parsing, file preparation and per-connection pragmas.

use std::path::Path;
use std::str::FromStr;

use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};

use crate::{ConnectOpts, DbError, Result};

/// True for `sqlite::memory:` and `mode=memory` DSNs.
#[must_use]
pub fn is_memory_dsn(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

/// Typed connect options for a `sqlite:` DSN.
///
/// File databases are created if missing and run in WAL mode with a busy timeout; every
/// connection enforces foreign keys.
pub fn connect_options(dsn: &str, opts: &ConnectOpts) -> Result<SqliteConnectOptions> {
    let dsn = dsn.trim();
    let base = SqliteConnectOptions::from_str(dsn)?.foreign_keys(true);

    if is_memory_dsn(dsn) {
        return Ok(base.journal_mode(SqliteJournalMode::Memory));
    }

    if opts.create_sqlite_dirs {
        prepare_parent_dir(base.get_filename())?;
    }

    Ok(base
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(opts.sqlite_busy_timeout))
}

fn prepare_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            std::fs::create_dir_all(dir).map_err(DbError::Io)
        }
        _ => Ok(()),
    }
}
