// FILE: src/core/file_index.rs
//! File Index
//!
//! Every file path is listed by exactly one folder and `FileEntry.folder`
//! names that folder. Writes that change ownership strip the path from all
//! folders before linking it again, which also heals snapshots where a path
//! ended up in several folders.

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use crate::core::model::{now_secs, FileEntry, Library, TRASH_ID, UNFILED_ID};
use crate::error::{LibraryError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrashReport {
    pub deleted: usize,
    pub errors: Vec<TrashError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashError {
    pub path: String,
    pub reason: String,
}

impl Library {
    /// Remove `path` from every folder's member list. Returns how many
    /// listings were dropped.
    pub(crate) fn unlink_everywhere(&mut self, path: &str) -> usize {
        let mut dropped = 0;
        for folder in self.folders.values_mut() {
            let before = folder.files.len();
            folder.files.retain(|p| p != path);
            dropped += before - folder.files.len();
        }
        dropped
    }

    /// Make `folder_id` the sole owner of `path`.
    pub(crate) fn link_file(&mut self, path: &str, folder_id: &str) -> bool {
        if !self.folders.contains_key(folder_id) {
            return false;
        }
        self.unlink_everywhere(path);
        if let Some(folder) = self.folders.get_mut(folder_id) {
            folder.files.push(path.to_string());
        }
        if let Some(entry) = self.files.get_mut(path) {
            entry.folder = folder_id.to_string();
        }
        true
    }

    /// Register a file, or relink an existing one into `folder_id` leaving
    /// its name, timestamps and tags as they were.
    pub fn add_file(&mut self, path: &str, name: &str, folder_id: &str) -> Result<FileEntry> {
        if path.trim().is_empty() {
            return Err(LibraryError::InvalidPath("empty file path".into()));
        }
        if !self.folders.contains_key(folder_id) {
            return Err(LibraryError::InvalidParent(folder_id.to_string()));
        }

        if !self.files.contains_key(path) {
            self.files.insert(path.to_string(), FileEntry::new(path, name, folder_id));
            tracing::debug!("[FileIndex] Added {} to {}", path, folder_id);
        }
        self.link_file(path, folder_id);

        self.files.get(path)
            .cloned()
            .ok_or_else(|| LibraryError::InvalidPath(path.to_string()))
    }

    pub fn remove_file(&mut self, path: &str) -> bool {
        let dropped = self.unlink_everywhere(path);
        let existed = self.files.remove(path).is_some();
        if !existed && dropped > 0 {
            tracing::warn!("[FileIndex] Dropped {} dangling listing(s) of {}", dropped, path);
        }
        existed
    }

    pub fn move_file_to_folder(&mut self, path: &str, folder_id: &str) -> bool {
        if !self.files.contains_key(path) || !self.folders.contains_key(folder_id) {
            return false;
        }
        self.link_file(path, folder_id)
    }

    pub fn move_to_trash(&mut self, path: &str) -> bool {
        self.move_file_to_folder(path, TRASH_ID)
    }

    pub fn rename_file(&mut self, path: &str, new_name: &str) -> bool {
        let new_name = new_name.trim();
        match self.files.get_mut(path) {
            Some(entry) if !new_name.is_empty() => {
                entry.name = new_name.to_string();
                true
            }
            _ => false,
        }
    }

    /// Drop every file listed in the trash from the index. Listings with no
    /// matching entry are reported and cleaned up; they do not stop the batch.
    pub fn empty_trash(&mut self) -> TrashReport {
        let listed = self.folders.get(TRASH_ID)
            .map(|f| f.files.clone())
            .unwrap_or_default();

        let mut report = TrashReport::default();
        let mut seen = HashSet::new();
        for path in listed {
            if !seen.insert(path.clone()) {
                continue;
            }
            if self.remove_file(&path) {
                report.deleted += 1;
            } else {
                self.unlink_everywhere(&path);
                report.errors.push(TrashError { path, reason: "not in file index".into() });
            }
        }

        tracing::info!("[FileIndex] Emptied trash: {} deleted, {} errors", report.deleted, report.errors.len());
        report
    }

    /// Stamp the open time. Returns false for unknown paths.
    pub fn update_last_opened(&mut self, path: &str) -> bool {
        match self.files.get_mut(path) {
            Some(entry) => {
                entry.last_opened = Some(now_secs());
                true
            }
            None => false,
        }
    }

    /// Most recently opened files first; never-opened files are excluded.
    pub fn recent_files(&self, limit: usize) -> Vec<&FileEntry> {
        let mut opened: Vec<&FileEntry> = self.files.values()
            .filter(|e| e.last_opened.is_some())
            .collect();
        opened.sort_by(|a, b| b.last_opened.cmp(&a.last_opened).then_with(|| a.path.cmp(&b.path)));
        opened.truncate(limit);
        opened
    }

    /// Rebuild folder member lists from `FileEntry.folder`. Entries pointing
    /// at a missing folder are moved to `unfiled`. Returns the number of fixes.
    pub(crate) fn repair_membership(&mut self) -> usize {
        let mut fixes = 0;

        for entry in self.files.values_mut() {
            if !self.folders.contains_key(&entry.folder) {
                entry.folder = UNFILED_ID.to_string();
                fixes += 1;
            }
        }

        let files = &self.files;
        for (owner, folder) in self.folders.iter_mut() {
            let before = folder.files.len();
            let mut seen = HashSet::new();
            folder.files.retain(|p| {
                files.get(p).is_some_and(|e| e.folder == *owner) && seen.insert(p.clone())
            });
            fixes += before - folder.files.len();
        }

        for entry in self.files.values() {
            if let Some(folder) = self.folders.get_mut(&entry.folder) {
                if !folder.files.contains(&entry.path) {
                    folder.files.push(entry.path.clone());
                    fixes += 1;
                }
            }
        }

        fixes
    }
}
