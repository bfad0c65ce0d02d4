// FILE: src/engine/importer.rs
//! Bulk folder import.
//!
//! Takes a flat list of file descriptors whose `folder_path` is relative to
//! the imported root, rebuilds that hierarchy as library folders and files
//! every descriptor into its folder. One bad descriptor never aborts the batch.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::core::model::{display_name_for, Library, DEFAULT_FOLDER_ICON};
use crate::error::{LibraryError, Result};

/// One file handed over by the import pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub file_path: String,
    #[serde(default)]
    pub file_name: String,
    /// `/` or `\` separated, relative to the import root. None for files
    /// sitting directly in the root.
    #[serde(default)]
    pub folder_path: Option<String>,
}

impl FileDescriptor {
    pub fn new(file_path: impl Into<String>, file_name: impl Into<String>, folder_path: Option<&str>) -> Self {
        Self {
            file_path: file_path.into(),
            file_name: file_name.into(),
            folder_path: folder_path.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub file_path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub root_folder_id: String,
    /// Folders created beneath the import root (the root itself not counted).
    pub folders_created: usize,
    pub files_imported: usize,
    pub files_skipped: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Split a relative folder path into its non-empty segments.
pub fn path_segments(folder_path: &str) -> Vec<String> {
    folder_path
        .split(|c: char| c == '/' || c == '\\')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect()
}

pub struct Importer;

impl Importer {
    pub fn import_folder(
        library: &mut Library,
        root_name: &str,
        descriptors: &[FileDescriptor],
        parent_id: &str,
    ) -> Result<ImportResult> {
        if !library.folders.contains_key(parent_id) {
            return Err(LibraryError::InvalidParent(parent_id.to_string()));
        }

        let root = library.create_folder(root_name, parent_id, DEFAULT_FOLDER_ICON)?;
        tracing::info!("[Importer] Importing {} file(s) into '{}' ({})", descriptors.len(), root.name, root.id);

        // 1. Every referenced folder path plus all of its prefixes.
        let mut wanted: BTreeSet<Vec<String>> = BTreeSet::new();
        for descriptor in descriptors {
            let segments = descriptor.folder_path.as_deref().map(path_segments).unwrap_or_default();
            for depth in 1..=segments.len() {
                wanted.insert(segments[..depth].to_vec());
            }
        }

        // 2. Ancestors before descendants.
        let mut ordered: Vec<Vec<String>> = wanted.into_iter().collect();
        ordered.sort_by_key(|segments| segments.len());

        let mut created: BTreeMap<Vec<String>, String> = BTreeMap::new();
        for segments in ordered {
            let parent = match segments.len() {
                1 => root.id.clone(),
                n => match created.get(&segments[..n - 1]) {
                    Some(id) => id.clone(),
                    None => root.id.clone(),
                },
            };
            let name = segments.last().map(String::as_str).unwrap_or_default();
            let folder = library.create_folder(name, &parent, DEFAULT_FOLDER_ICON)?;
            created.insert(segments, folder.id);
        }

        // 3. File every descriptor.
        let mut result = ImportResult {
            root_folder_id: root.id.clone(),
            folders_created: created.len(),
            files_imported: 0,
            files_skipped: 0,
            skipped: Vec::new(),
        };
        let mut seen: HashSet<&str> = HashSet::new();

        for descriptor in descriptors {
            let path = descriptor.file_path.trim();
            let skip_reason = if path.is_empty() {
                Some("missing file path".to_string())
            } else if !seen.insert(path) {
                Some("duplicate path in batch".to_string())
            } else {
                let segments = descriptor.folder_path.as_deref().map(path_segments).unwrap_or_default();
                let target = created.get(&segments).unwrap_or(&root.id).clone();
                library.add_file(path, &descriptor.file_name, &target).err().map(|e| e.to_string())
            };

            match skip_reason {
                None => result.files_imported += 1,
                Some(reason) => {
                    tracing::warn!("[Importer] Skipped '{}': {}", descriptor.file_path, reason);
                    result.skipped.push(SkippedFile { file_path: descriptor.file_path.clone(), reason });
                }
            }
        }
        result.files_skipped = result.skipped.len();

        tracing::info!(
            "[Importer] Done: {} folder(s), {} file(s) imported, {} skipped",
            result.folders_created, result.files_imported, result.files_skipped
        );
        Ok(result)
    }

    /// Build descriptors for every regular file below `dir`. Hidden entries
    /// and symlinks are skipped.
    pub fn descriptors_from_dir(dir: &Path) -> Result<Vec<FileDescriptor>> {
        if !dir.is_dir() {
            return Err(LibraryError::InvalidPath(format!("{} is not a directory", dir.display())));
        }

        let mut descriptors = Vec::new();
        for entry in walkdir::WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("[Importer] Cannot read entry under {}: {}", dir.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let folder_path = path.parent()
                .and_then(|p| p.strip_prefix(dir).ok())
                .map(|rel| rel.to_string_lossy().to_string())
                .filter(|rel| !rel.is_empty());
            let file_path = path.to_string_lossy().to_string();

            descriptors.push(FileDescriptor {
                file_name: display_name_for(&file_path),
                file_path,
                folder_path,
            });
        }

        tracing::debug!("[Importer] Found {} file(s) under {}", descriptors.len(), dir.display());
        Ok(descriptors)
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}
