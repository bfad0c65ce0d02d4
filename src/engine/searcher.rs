// FILE: src/engine/searcher.rs
//! Read-only queries over the folder tree and file index.

use crate::core::model::{FileEntry, Folder, Library};
use crate::core::tags::normalize_tag_name;

pub struct Searcher;

impl Searcher {
    /// Case-insensitive substring match on file name or any tag name.
    /// A blank query matches nothing.
    pub fn search_files<'a>(library: &'a Library, query: &str) -> Vec<&'a FileEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let results: Vec<&FileEntry> = library.files.values()
            .filter(|entry| {
                entry.name.to_lowercase().contains(&needle)
                    || entry.tags.iter().any(|t| t.name.contains(&needle))
            })
            .collect();

        tracing::debug!("[Searcher] '{}' matched {} file(s)", query, results.len());
        results
    }

    /// Same matching rules applied to folders.
    pub fn search_folders<'a>(library: &'a Library, query: &str) -> Vec<&'a Folder> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        library.folders.values()
            .filter(|folder| {
                folder.name.to_lowercase().contains(&needle)
                    || folder.tags.iter().any(|t| t.name.contains(&needle))
            })
            .collect()
    }

    /// Files listed directly in `folder_id`, in listing order.
    pub fn files_by_folder<'a>(library: &'a Library, folder_id: &str) -> Vec<&'a FileEntry> {
        library.folders.get(folder_id)
            .map(|folder| folder.files.iter().filter_map(|p| library.files.get(p)).collect())
            .unwrap_or_default()
    }

    /// Files carrying the tag `name` (exact match after normalization).
    pub fn files_by_tag<'a>(library: &'a Library, name: &str) -> Vec<&'a FileEntry> {
        let name = normalize_tag_name(name);
        if name.is_empty() {
            return Vec::new();
        }
        library.files.values()
            .filter(|entry| entry.tags.iter().any(|t| t.name == name))
            .collect()
    }
}
