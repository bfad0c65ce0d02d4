//! docshelf: personal document library
//!
//! A persistent catalogue of imported files organized into a folder tree:
//! - Core (folders, file entries, tags and the invariants tying them together)
//! - Engine (search projections and bulk folder import)
//! - Storage (the whole library persisted as one snapshot in SQLite)
//! - Librarian (owned handle: mutate, persist, broadcast)

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod librarian;
pub mod state;
pub mod storage;

pub use config::LibraryConfig;
pub use error::{Result, LibraryError};
pub use librarian::Librarian;
pub use state::{LibraryChange, LibraryEvent, SharedLibrary};
pub use crate::core::{
    Library, Folder, FolderKind, FileEntry, Tag, TagColor, TagOwner, VocabularyScope,
    TrashReport, TrashError,
    ROOT_ID, PUBLICATIONS_ID, DUPLICATES_ID, UNFILED_ID, TRASH_ID, DEFAULT_FOLDER_ICON,
};
pub use engine::{FileDescriptor, ImportResult, Importer, Searcher, SkippedFile};
pub use storage::{MemoryStore, SnapshotStore, SqliteStore};
