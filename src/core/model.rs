// FILE: src/core/model.rs
//! Library aggregate: folders, file entries and the top-level ordering.
//!
//! The whole `Library` is persisted as one JSON document, so every field
//! here is part of the on-disk format (camelCase keys).

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};
use crate::core::tags::{normalize_tag_set, Tag};

// --- RESERVED FOLDER IDS ---
pub const ROOT_ID: &str = "root";
pub const PUBLICATIONS_ID: &str = "my-publications";
pub const DUPLICATES_ID: &str = "duplicate-items";
pub const UNFILED_ID: &str = "unfiled";
pub const TRASH_ID: &str = "trash";

/// Bumped whenever the persisted layout changes shape.
pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_FOLDER_ICON: &str = "📁";

/// (id, display name, icon) for the permanent folders, in sidebar order.
const SPECIAL_FOLDERS: [(&str, &str, &str); 4] = [
    (PUBLICATIONS_ID, "My Publications", "📝"),
    (DUPLICATES_ID, "Duplicate Items", "📑"),
    (UNFILED_ID, "Unfiled Items", "📄"),
    (TRASH_ID, "Trash", "🗑️"),
];

pub fn is_reserved_id(id: &str) -> bool {
    id == ROOT_ID || SPECIAL_FOLDERS.iter().any(|(special, _, _)| *special == id)
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn default_icon() -> String {
    DEFAULT_FOLDER_ICON.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderKind {
    /// The single root of the tree.
    Library,
    /// Permanent system folders (unfiled, trash, ...).
    Special,
    /// Everything the user creates.
    Folder,
}

impl FolderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Library => "library",
            Self::Special => "special",
            Self::Folder => "folder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(alias = "type")]
    pub kind: FolderKind,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Sidebar hint only; never consulted by tree operations.
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub created_at: u64,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, icon: impl Into<String>, kind: FolderKind, parent: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            kind,
            parent,
            children: Vec::new(),
            files: Vec::new(),
            tags: Vec::new(),
            expanded: false,
            created_at: now_secs(),
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.kind != FolderKind::Folder
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub name: String,
    pub folder: String,
    #[serde(default)]
    pub added_at: u64,
    #[serde(default)]
    pub last_opened: Option<u64>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl FileEntry {
    /// An empty `name` falls back to the last component of `path`.
    pub fn new(path: &str, name: &str, folder: &str) -> Self {
        let name = if name.trim().is_empty() {
            display_name_for(path)
        } else {
            name.trim().to_string()
        };

        Self {
            path: path.to_string(),
            name,
            folder: folder.to_string(),
            added_at: now_secs(),
            last_opened: None,
            tags: Vec::new(),
        }
    }
}

pub(crate) fn display_name_for(path: &str) -> String {
    // Paths may come from either platform; take whatever follows the last separator.
    let tail = path.rsplit(|c: char| c == '/' || c == '\\').find(|s| !s.is_empty());
    match tail {
        Some(name) => name.to_string(),
        None => Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub folders: BTreeMap<String, Folder>,
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,
    /// Ids rendered at the top level of the sidebar.
    #[serde(default)]
    pub folder_order: Vec<String>,
    #[serde(skip)]
    next_seq: u64,
}

impl Library {
    /// A fresh library holding only the permanent folders.
    pub fn new() -> Self {
        let mut library = Self { version: SCHEMA_VERSION, ..Self::default() };
        library.ensure_special_folders();
        library
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.get(id)
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    pub fn root(&self) -> Option<&Folder> {
        self.folders.get(ROOT_ID)
    }

    /// Recreate any missing permanent folder under its reserved id.
    /// Returns true if something had to be created or relinked.
    pub fn ensure_special_folders(&mut self) -> bool {
        let mut changed = false;

        if !self.folders.contains_key(ROOT_ID) {
            let mut root = Folder::new(ROOT_ID, "My Library", "📚", FolderKind::Library, None);
            root.expanded = true;
            self.folders.insert(ROOT_ID.to_string(), root);
            tracing::info!("[Library] Created root folder");
            changed = true;
        }

        // Reserved ids always carry their permanent kind; the root has no parent.
        let stale_parent = match self.folders.get_mut(ROOT_ID) {
            Some(root) => {
                if root.kind != FolderKind::Library {
                    root.kind = FolderKind::Library;
                    changed = true;
                }
                root.parent.take()
            }
            None => None,
        };
        if let Some(parent) = stale_parent.and_then(|p| self.folders.get_mut(&p)) {
            parent.children.retain(|c| c != ROOT_ID);
            changed = true;
        }

        if !self.folder_order.iter().any(|id| id == ROOT_ID) {
            self.folder_order.insert(0, ROOT_ID.to_string());
            changed = true;
        }

        for (id, name, icon) in SPECIAL_FOLDERS {
            if !self.folders.contains_key(id) {
                let folder = Folder::new(id, name, icon, FolderKind::Special, Some(ROOT_ID.to_string()));
                self.folders.insert(id.to_string(), folder);
                tracing::info!("[Library] Created special folder '{}'", id);
                changed = true;
            }

            if let Some(folder) = self.folders.get_mut(id) {
                if folder.kind != FolderKind::Special {
                    tracing::warn!("[Library] Reserved folder '{}' had kind '{}'", id, folder.kind.as_str());
                    folder.kind = FolderKind::Special;
                    changed = true;
                }
            }

            // Reattach to the root if the recorded parent vanished.
            let parent_missing = self.folders.get(id)
                .and_then(|f| f.parent.as_deref())
                .map_or(true, |p| !self.folders.contains_key(p));
            if parent_missing {
                if let Some(folder) = self.folders.get_mut(id) {
                    folder.parent = Some(ROOT_ID.to_string());
                }
                changed = true;
            }

            let parent_id = self.folders.get(id)
                .and_then(|f| f.parent.clone())
                .unwrap_or_else(|| ROOT_ID.to_string());
            if let Some(parent) = self.folders.get_mut(&parent_id) {
                if !parent.children.iter().any(|c| c == id) {
                    parent.children.push(id.to_string());
                    changed = true;
                }
            }
        }

        changed
    }

    /// Bring a freshly loaded snapshot up to the current shape: reserved
    /// folders present, tag sets normalized, file membership consistent.
    pub fn migrate(&mut self) -> bool {
        let mut changed = false;

        if self.version != SCHEMA_VERSION {
            if self.version > SCHEMA_VERSION {
                tracing::warn!(
                    "[Library] Snapshot version {} is newer than supported version {}",
                    self.version, SCHEMA_VERSION
                );
            }
            self.version = SCHEMA_VERSION;
            changed = true;
        }

        // The map key is authoritative for a folder's id.
        for (key, folder) in self.folders.iter_mut() {
            if folder.id != *key {
                tracing::warn!("[Library] Folder stored under '{}' claimed id '{}'", key, folder.id);
                folder.id = key.clone();
                changed = true;
            }
        }

        changed |= self.ensure_special_folders();

        let mut tag_fixes = 0;
        for folder in self.folders.values_mut() {
            if normalize_tag_set(&mut folder.tags) {
                tag_fixes += 1;
            }
        }
        for entry in self.files.values_mut() {
            if normalize_tag_set(&mut entry.tags) {
                tag_fixes += 1;
            }
        }
        if tag_fixes > 0 {
            tracing::info!("[Library] Normalized tags on {} owners", tag_fixes);
            changed = true;
        }

        let repaired = self.repair_membership();
        if repaired > 0 {
            tracing::warn!("[Library] Repaired {} inconsistent file memberships", repaired);
            changed = true;
        }

        changed
    }

    /// Allocate a folder id that is not in use.
    pub(crate) fn next_folder_id(&mut self) -> String {
        loop {
            self.next_seq += 1;
            let id = format!("folder-{}-{}", now_millis(), self.next_seq);
            if !self.folders.contains_key(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_library_has_all_special_folders() {
        let library = Library::new();
        let root = library.root().unwrap();
        assert_eq!(root.kind, FolderKind::Library);
        assert!(root.parent.is_none());
        assert_eq!(library.folder_order, vec![ROOT_ID.to_string()]);

        for id in [PUBLICATIONS_ID, DUPLICATES_ID, UNFILED_ID, TRASH_ID] {
            let folder = library.folder(id).unwrap();
            assert_eq!(folder.kind, FolderKind::Special);
            assert_eq!(folder.parent.as_deref(), Some(ROOT_ID));
            assert!(root.children.iter().any(|c| c == id));
        }
    }

    #[test]
    fn ensure_special_folders_recreates_missing_ones() {
        let mut library = Library::new();
        library.folders.remove(TRASH_ID);
        if let Some(root) = library.folders.get_mut(ROOT_ID) {
            root.children.retain(|c| c != TRASH_ID);
        }

        assert!(library.ensure_special_folders());
        assert!(library.folder(TRASH_ID).is_some());
        assert!(!library.ensure_special_folders());
    }

    #[test]
    fn reserved_ids_get_their_permanent_kind_back() {
        let mut library = Library::new();
        library.folders.get_mut(UNFILED_ID).unwrap().kind = FolderKind::Folder;
        library.folders.get_mut(ROOT_ID).unwrap().kind = FolderKind::Folder;

        assert!(library.ensure_special_folders());
        assert_eq!(library.folder(UNFILED_ID).unwrap().kind, FolderKind::Special);
        assert_eq!(library.root().unwrap().kind, FolderKind::Library);
    }

    #[test]
    fn root_parent_is_cleared() {
        let mut library = Library::new();
        library.folders.get_mut(ROOT_ID).unwrap().parent = Some(TRASH_ID.to_string());
        library.folders.get_mut(TRASH_ID).unwrap().children.push(ROOT_ID.to_string());

        assert!(library.ensure_special_folders());
        assert!(library.root().unwrap().parent.is_none());
        assert!(library.folder(TRASH_ID).unwrap().children.is_empty());
    }

    #[test]
    fn migrate_takes_folder_id_from_map_key() {
        let mut library = Library::new();
        library.add_file("/a.pdf", "a", UNFILED_ID).unwrap();
        library.folders.get_mut(UNFILED_ID).unwrap().id = "stale".to_string();

        assert!(library.migrate());
        let unfiled = library.folder(UNFILED_ID).unwrap();
        assert_eq!(unfiled.id, UNFILED_ID);
        assert_eq!(unfiled.files, vec!["/a.pdf".to_string()]);
    }

    #[test]
    fn folder_ids_are_unique() {
        let mut library = Library::new();
        let a = library.next_folder_id();
        let b = library.next_folder_id();
        assert_ne!(a, b);
        assert!(!is_reserved_id(&a));
    }

    #[test]
    fn display_name_handles_both_separators() {
        assert_eq!(display_name_for("/home/me/paper.pdf"), "paper.pdf");
        assert_eq!(display_name_for("C:\\docs\\book.epub"), "book.epub");
        assert_eq!(display_name_for("plain.txt"), "plain.txt");
    }

    #[test]
    fn file_entry_defaults_name_from_path() {
        let entry = FileEntry::new("/a/b/notes.docx", "  ", UNFILED_ID);
        assert_eq!(entry.name, "notes.docx");
        assert_eq!(entry.folder, UNFILED_ID);
        assert!(entry.last_opened.is_none());
    }
}
