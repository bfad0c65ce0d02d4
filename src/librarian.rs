// FILE: src/librarian.rs
//! Librarian: the owned handle to the library.
//!
//! Every mutator runs to completion on `&mut self`, then saves the whole
//! snapshot through the `SnapshotStore` and broadcasts a `LibraryEvent`.
//! A failed save is logged and swallowed: the in-memory library stays the
//! source of truth for the rest of the session.
//!
//! Subscribers must not call back into the Librarian from their receive
//! loop while a mutation is in flight; the `&mut self` receivers already
//! make that impossible from the same thread.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use crate::config::LibraryConfig;
use crate::core::file_index::TrashReport;
use crate::core::model::{FileEntry, Folder, Library, UNFILED_ID};
use crate::core::tags::{TagColor, TagOwner, VocabularyScope};
use crate::engine::{FileDescriptor, ImportResult, Importer, Searcher};
use crate::error::Result;
use crate::state::{LibraryChange, LibraryEvent};
use crate::storage::{SnapshotStore, SqliteStore};

pub struct Librarian {
    library: Library,
    store: Box<dyn SnapshotStore>,
    events: broadcast::Sender<LibraryEvent>,
    /// False once the stored snapshot proved unreadable; saves are skipped
    /// so the unreadable data is never overwritten.
    durable: bool,
}

impl Librarian {
    /// Load the library from `store`, or start a fresh one. The loaded
    /// snapshot is migrated before any operation can see it. An unreadable
    /// snapshot is left alone and the session runs on a fresh, non-durable
    /// library.
    pub fn open(store: Box<dyn SnapshotStore>, event_capacity: usize) -> Result<Self> {
        let mut durable = true;
        let (library, needs_save) = match store.load() {
            Ok(Some(mut library)) => {
                let migrated = library.migrate();
                tracing::info!(
                    "[Librarian] Loaded {} folder(s), {} file(s)",
                    library.folders.len(), library.files.len()
                );
                (library, migrated)
            }
            Ok(None) => {
                tracing::info!("[Librarian] No saved library, starting fresh");
                (Library::new(), true)
            }
            Err(e) => {
                tracing::error!("[Librarian] Saved library is unreadable, changes will not be durable this session: {}", e);
                durable = false;
                (Library::new(), false)
            }
        };

        let (events, _) = broadcast::channel(event_capacity.max(1));
        let mut librarian = Self { library, store, events, durable };
        if needs_save {
            librarian.commit(LibraryChange::Loaded);
        }
        Ok(librarian)
    }

    /// Open the SQLite-backed library described by `config`.
    pub fn from_config(config: &LibraryConfig) -> Result<Self> {
        let store = SqliteStore::open(&config.db_path)?;
        Self::open(Box::new(store), config.event_capacity)
    }

    pub fn open_path(db_path: &Path) -> Result<Self> {
        Self::from_config(&LibraryConfig::new(db_path))
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn snapshot(&self) -> Arc<Library> {
        Arc::new(self.library.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.events.subscribe()
    }

    /// Whether mutations are being written to the store.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    fn persist(&mut self) {
        if !self.durable {
            tracing::debug!("[Librarian] Skipping save, session is not durable");
            return;
        }
        if let Err(e) = self.store.save(&self.library) {
            tracing::warn!("[Librarian] Save failed, changes are not durable: {}", e);
        }
    }

    fn commit(&mut self, change: LibraryChange) {
        self.persist();
        if self.events.receiver_count() > 0 {
            let event = LibraryEvent { change, snapshot: self.snapshot() };
            // Only fails when every receiver has been dropped meanwhile.
            let _ = self.events.send(event);
        }
    }

    fn commit_if(&mut self, changed: bool, change: impl FnOnce() -> LibraryChange) -> bool {
        if changed {
            self.commit(change());
        }
        changed
    }

    // ========== FOLDER TREE ==========

    pub fn create_folder(&mut self, name: &str, parent_id: &str, icon: &str) -> Result<Folder> {
        let folder = self.library.create_folder(name, parent_id, icon)?;
        self.commit(LibraryChange::FolderCreated { id: folder.id.clone() });
        Ok(folder)
    }

    pub fn rename_folder(&mut self, id: &str, new_name: &str) -> bool {
        let changed = self.library.rename_folder(id, new_name);
        self.commit_if(changed, || LibraryChange::FolderRenamed { id: id.to_string() })
    }

    pub fn move_folder(&mut self, id: &str, new_parent_id: &str) -> bool {
        let changed = self.library.move_folder(id, new_parent_id);
        self.commit_if(changed, || LibraryChange::FolderMoved { id: id.to_string(), parent: new_parent_id.to_string() })
    }

    pub fn delete_folder(&mut self, id: &str) -> bool {
        let changed = self.library.delete_folder(id);
        self.commit_if(changed, || LibraryChange::FolderDeleted { id: id.to_string() })
    }

    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        let changed = self.library.toggle_expanded(id);
        self.commit_if(changed, || LibraryChange::FolderToggled { id: id.to_string() })
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.library.folder(id)
    }

    // ========== TAGS ==========

    pub fn add_tag(&mut self, owner: TagOwner<'_>, name: &str, color: TagColor) -> bool {
        let changed = self.library.add_tag(owner, name, color);
        self.commit_if(changed, || LibraryChange::TagsChanged)
    }

    pub fn remove_tag(&mut self, owner: TagOwner<'_>, name: &str) -> bool {
        let changed = self.library.remove_tag(owner, name);
        self.commit_if(changed, || LibraryChange::TagsChanged)
    }

    pub fn set_tag_color(&mut self, owner: TagOwner<'_>, name: &str, color: TagColor) -> bool {
        let changed = self.library.set_tag_color(owner, name, color);
        self.commit_if(changed, || LibraryChange::TagsChanged)
    }

    pub fn vocabulary(&self, scope: VocabularyScope) -> Vec<String> {
        self.library.vocabulary(scope)
    }

    // ========== FILE INDEX ==========

    pub fn add_file(&mut self, path: &str, name: &str, folder_id: Option<&str>) -> Result<FileEntry> {
        let entry = self.library.add_file(path, name, folder_id.unwrap_or(UNFILED_ID))?;
        self.commit(LibraryChange::FileAdded { path: entry.path.clone() });
        Ok(entry)
    }

    pub fn remove_file(&mut self, path: &str) -> bool {
        let changed = self.library.remove_file(path);
        self.commit_if(changed, || LibraryChange::FileRemoved { path: path.to_string() })
    }

    pub fn move_file_to_folder(&mut self, path: &str, folder_id: &str) -> bool {
        let changed = self.library.move_file_to_folder(path, folder_id);
        self.commit_if(changed, || LibraryChange::FileMoved { path: path.to_string(), folder: folder_id.to_string() })
    }

    pub fn move_to_trash(&mut self, path: &str) -> bool {
        let changed = self.library.move_to_trash(path);
        self.commit_if(changed, || LibraryChange::FileMoved { path: path.to_string(), folder: crate::core::TRASH_ID.to_string() })
    }

    pub fn rename_file(&mut self, path: &str, new_name: &str) -> bool {
        let changed = self.library.rename_file(path, new_name);
        self.commit_if(changed, || LibraryChange::FileUpdated { path: path.to_string() })
    }

    pub fn empty_trash(&mut self) -> TrashReport {
        let report = self.library.empty_trash();
        let changed = report.deleted > 0 || !report.errors.is_empty();
        self.commit_if(changed, || LibraryChange::TrashEmptied { deleted: report.deleted });
        report
    }

    pub fn update_last_opened(&mut self, path: &str) {
        let changed = self.library.update_last_opened(path);
        self.commit_if(changed, || LibraryChange::FileUpdated { path: path.to_string() });
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.library.file(path)
    }

    pub fn recent_files(&self, limit: usize) -> Vec<&FileEntry> {
        self.library.recent_files(limit)
    }

    // ========== QUERIES ==========

    pub fn search_files(&self, query: &str) -> Vec<&FileEntry> {
        Searcher::search_files(&self.library, query)
    }

    pub fn search_folders(&self, query: &str) -> Vec<&Folder> {
        Searcher::search_folders(&self.library, query)
    }

    pub fn files_by_folder(&self, folder_id: &str) -> Vec<&FileEntry> {
        Searcher::files_by_folder(&self.library, folder_id)
    }

    pub fn files_by_tag(&self, name: &str) -> Vec<&FileEntry> {
        Searcher::files_by_tag(&self.library, name)
    }

    /// Import a batch in one commit. Callers wanting progress feedback
    /// should split large batches into several calls.
    pub fn import_folder(&mut self, root_name: &str, descriptors: &[FileDescriptor], parent_id: &str) -> Result<ImportResult> {
        let result = Importer::import_folder(&mut self.library, root_name, descriptors, parent_id)?;
        self.commit(LibraryChange::FolderImported { id: result.root_folder_id.clone() });
        Ok(result)
    }
}
