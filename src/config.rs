//! Runtime configuration
//!
//! Resolved from the environment so the binary and embedding applications
//! agree on where the library lives.

use std::env;
use std::path::PathBuf;
use crate::error::{LibraryError, Result};

const DB_ENV: &str = "DOCSHELF_DB";
const EVENT_CAPACITY_ENV: &str = "DOCSHELF_EVENT_CAPACITY";

/// Subscribers lagging further behind than this lose the oldest snapshots.
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// SQLite file holding the serialized library.
    pub db_path: PathBuf,
    /// Buffer size of the change-notification channel.
    pub event_capacity: usize,
}

impl LibraryConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into(), event_capacity: DEFAULT_EVENT_CAPACITY }
    }

    /// Read `DOCSHELF_DB` and `DOCSHELF_EVENT_CAPACITY`, falling back to the
    /// platform data directory.
    pub fn from_env() -> Result<Self> {
        let db_path = match env::var_os(DB_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::default_db_path()?,
        };

        let event_capacity = match env::var(EVENT_CAPACITY_ENV) {
            Ok(raw) => parse_capacity(&raw)?,
            Err(_) => DEFAULT_EVENT_CAPACITY,
        };

        Ok(Self { db_path, event_capacity })
    }

    pub fn default_db_path() -> Result<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| LibraryError::Config("No data directory for this platform".into()))?;
        Ok(base.join("docshelf").join("library.db"))
    }
}

fn parse_capacity(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(LibraryError::Config(format!(
            "{} must be a positive integer, got '{}'", EVENT_CAPACITY_ENV, raw
        ))),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_must_be_positive() {
        assert_eq!(parse_capacity("32").unwrap(), 32);
        assert_eq!(parse_capacity(" 4 ").unwrap(), 4);
        assert!(parse_capacity("0").is_err());
        assert!(parse_capacity("lots").is_err());
    }

    #[test]
    fn explicit_path_uses_default_capacity() {
        let config = LibraryConfig::new("/tmp/lib.db");
        assert_eq!(config.db_path, PathBuf::from("/tmp/lib.db"));
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }
}
