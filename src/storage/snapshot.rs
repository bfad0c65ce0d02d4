// FILE: src/storage/snapshot.rs
//! Persistence Adapter
//!
//! The library is stored as a single JSON blob. `SnapshotStore` is the seam
//! the `Librarian` talks to; the SQLite store keeps the blob in the
//! `kv_store` table, the memory store keeps it in a `String`.

use std::path::Path;
use rusqlite::Connection;
use crate::core::model::Library;
use crate::error::Result;
use crate::storage::connection::{open_database, open_in_memory};
use crate::storage::Repository;

/// Key the serialized library lives under.
pub const LIBRARY_KEY: &str = "library";

pub trait SnapshotStore: Send {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Library>>;
    fn save(&mut self, library: &Library) -> Result<()>;
}

pub fn encode(library: &Library) -> Result<String> {
    Ok(serde_json::to_string(library)?)
}

pub fn decode(blob: &str) -> Result<Library> {
    Ok(serde_json::from_str(blob)?)
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self { conn: open_database(db_path)? })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self { conn: open_in_memory()? })
    }

    /// Forget the stored snapshot. Returns false if none existed.
    pub fn clear(&mut self) -> Result<bool> {
        Repository::new(&self.conn).remove(LIBRARY_KEY)
    }
}

impl SnapshotStore for SqliteStore {
    fn load(&self) -> Result<Option<Library>> {
        match Repository::new(&self.conn).get(LIBRARY_KEY)? {
            Some(blob) => Ok(Some(decode(&blob)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, library: &Library) -> Result<()> {
        let blob = encode(library)?;
        Repository::new(&self.conn).set(LIBRARY_KEY, &blob)?;
        tracing::trace!("[Store] Saved snapshot ({} bytes)", blob.len());
        Ok(())
    }
}

/// Keeps the serialized snapshot in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blob: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing serialized snapshot.
    pub fn from_json(blob: impl Into<String>) -> Self {
        Self { blob: Some(blob.into()) }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Library>> {
        self.blob.as_deref().map(decode).transpose()
    }

    fn save(&mut self, library: &Library) -> Result<()> {
        self.blob = Some(encode(library)?);
        Ok(())
    }
}
