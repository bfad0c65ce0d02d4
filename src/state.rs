// FILE: src/state.rs
//! Change notifications broadcast after every successful mutation.

use std::sync::Arc;
use crate::core::model::Library;

/// Immutable view of the library handed to subscribers.
pub type SharedLibrary = Arc<Library>;

/// What a mutation touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryChange {
    Loaded,
    FolderCreated { id: String },
    FolderRenamed { id: String },
    FolderMoved { id: String, parent: String },
    FolderDeleted { id: String },
    FolderToggled { id: String },
    TagsChanged,
    FileAdded { path: String },
    FileRemoved { path: String },
    FileMoved { path: String, folder: String },
    FileUpdated { path: String },
    TrashEmptied { deleted: usize },
    FolderImported { id: String },
}

/// Sent on the broadcast channel: the change plus the full library after it.
#[derive(Debug, Clone)]
pub struct LibraryEvent {
    pub change: LibraryChange,
    pub snapshot: SharedLibrary,
}
