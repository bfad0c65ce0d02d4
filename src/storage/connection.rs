//! Database connection management
//!
//! Opens the SQLite file backing the library snapshot and makes sure the
//! key-value table exists.

use std::path::Path;
use rusqlite::Connection;
use crate::error::{LibraryError, Result};
use crate::storage::Repository;

/// Open (or create) the database at `db_path`.
pub fn open_database(db_path: &Path) -> Result<Connection> {
    let db_dir = db_path.parent()
        .ok_or_else(|| LibraryError::InvalidPath(format!("Invalid database path: {}", db_path.display())))?;

    if !db_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(db_dir).map_err(LibraryError::Io)?;
    }

    let conn = Connection::open(db_path).map_err(LibraryError::Database)?;

    // WAL keeps readers (another CLI invocation) off the writer's back.
    let mode: String = conn.pragma_update_and_check(None, "journal_mode", WAL, |row| row.get(0))?;
    tracing::debug!("[Store] journal_mode={}", mode);
    conn.pragma_update(None, "synchronous", NORMAL)?;

    Repository::new(&conn).initialize()?;
    tracing::info!("[Store] Database ready at {}", db_path.display());
    Ok(conn)
}

/// Throwaway database for tests and ephemeral sessions.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(LibraryError::Database)?;
    Repository::new(&conn).initialize()?;
    Ok(conn)
}

// SQL pragma constants
const WAL: &str = "WAL";
const NORMAL: &str = "NORMAL";
