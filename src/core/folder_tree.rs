// FILE: src/core/folder_tree.rs
//! Folder Tree
//!
//! Structural operations on the folder hierarchy. Unknown ids, root moves
//! and cycle-creating moves are answered with `false` so a stale id from
//! the UI can never wedge the tree.

use std::collections::HashSet;
use crate::core::model::{is_reserved_id, Folder, FolderKind, Library, DEFAULT_FOLDER_ICON, ROOT_ID, UNFILED_ID};
use crate::error::{LibraryError, Result};

impl Library {
    /// Create a folder under `parent_id`.
    pub fn create_folder(&mut self, name: &str, parent_id: &str, icon: &str) -> Result<Folder> {
        if !self.folders.contains_key(parent_id) {
            return Err(LibraryError::InvalidParent(parent_id.to_string()));
        }

        let name = match name.trim() {
            "" => "New Folder",
            trimmed => trimmed,
        };
        let icon = if icon.is_empty() { DEFAULT_FOLDER_ICON } else { icon };

        let id = self.next_folder_id();
        let folder = Folder::new(id.clone(), name, icon, FolderKind::Folder, Some(parent_id.to_string()));

        if let Some(parent) = self.folders.get_mut(parent_id) {
            parent.children.push(id.clone());
        }
        if parent_id == ROOT_ID && !self.folder_order.iter().any(|f| f == ROOT_ID) {
            self.folder_order.push(ROOT_ID.to_string());
        }
        self.folders.insert(id.clone(), folder.clone());

        tracing::debug!("[FolderTree] Created '{}' ({}) under {}", folder.name, id, parent_id);
        Ok(folder)
    }

    pub fn rename_folder(&mut self, id: &str, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return false;
        }
        match self.folders.get_mut(id) {
            Some(folder) => {
                folder.name = new_name.to_string();
                true
            }
            None => false,
        }
    }

    /// Reparent `id` under `new_parent_id`. Rejects the root, unknown ids
    /// and any move that would make a folder its own ancestor.
    pub fn move_folder(&mut self, id: &str, new_parent_id: &str) -> bool {
        let Some(folder) = self.folders.get(id) else {
            tracing::debug!("[FolderTree] move_folder: unknown folder {}", id);
            return false;
        };
        if folder.kind == FolderKind::Library {
            tracing::warn!("[FolderTree] Refusing to move the library root");
            return false;
        }
        if !self.folders.contains_key(new_parent_id) {
            tracing::debug!("[FolderTree] move_folder: unknown parent {}", new_parent_id);
            return false;
        }
        if id == new_parent_id || self.is_descendant(new_parent_id, id) {
            tracing::warn!("[FolderTree] Cycle detected: {} cannot move under {}", id, new_parent_id);
            return false;
        }

        let old_parent = folder.parent.clone();
        if let Some(parent) = old_parent.as_deref().and_then(|p| self.folders.get_mut(p)) {
            parent.children.retain(|c| c != id);
        }
        if let Some(parent) = self.folders.get_mut(new_parent_id) {
            if !parent.children.iter().any(|c| c == id) {
                parent.children.push(id.to_string());
            }
        }
        if let Some(folder) = self.folders.get_mut(id) {
            folder.parent = Some(new_parent_id.to_string());
        }
        self.folder_order.retain(|f| f != id);

        tracing::debug!("[FolderTree] Moved {} from {:?} to {}", id, old_parent, new_parent_id);
        true
    }

    /// Delete a user folder and its whole subtree. Files found anywhere in
    /// the subtree are moved to `unfiled`; permanent folders that had been
    /// moved inside it are reattached to the root instead of deleted.
    pub fn delete_folder(&mut self, id: &str) -> bool {
        let Some(folder) = self.folders.get(id) else {
            return false;
        };
        if folder.is_permanent() || is_reserved_id(id) {
            tracing::warn!("[FolderTree] Refusing to delete {} folder '{}'", folder.kind.as_str(), id);
            return false;
        }
        let parent_id = folder.parent.clone();

        // 1. Compute the affected set before touching the maps.
        let mut doomed: Vec<String> = Vec::new();
        let mut rescued: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(node) = self.folders.get(&current) else {
                continue;
            };
            if current != id && (node.is_permanent() || is_reserved_id(&current)) {
                rescued.push(current);
                continue;
            }
            stack.extend(node.children.iter().rev().cloned());
            doomed.push(current);
        }

        let orphaned: Vec<String> = doomed.iter()
            .filter_map(|f| self.folders.get(f))
            .flat_map(|f| f.files.iter().cloned())
            .collect();

        // 2. Unlink and drop the subtree.
        if let Some(parent) = parent_id.as_deref().and_then(|p| self.folders.get_mut(p)) {
            parent.children.retain(|c| c != id);
        }
        for doomed_id in &doomed {
            self.folders.remove(doomed_id);
        }
        self.folder_order.retain(|f| !seen.contains(f) || rescued.contains(f));

        for special in &rescued {
            if let Some(folder) = self.folders.get_mut(special) {
                folder.parent = Some(ROOT_ID.to_string());
            }
            if let Some(root) = self.folders.get_mut(ROOT_ID) {
                if !root.children.contains(special) {
                    root.children.push(special.clone());
                }
            }
        }

        // 3. Redistribute files.
        let mut redistributed = 0;
        for path in &orphaned {
            if self.files.contains_key(path) && self.link_file(path, UNFILED_ID) {
                redistributed += 1;
            }
        }

        tracing::info!(
            "[FolderTree] Deleted {} folder(s) rooted at {}; {} file(s) moved to unfiled",
            doomed.len(), id, redistributed
        );
        true
    }

    /// Flip the sidebar expanded flag.
    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        match self.folders.get_mut(id) {
            Some(folder) => {
                folder.expanded = !folder.expanded;
                true
            }
            None => false,
        }
    }

    /// Parent chain of `id`, nearest first, ending at the root. Stops early
    /// if a corrupted snapshot contains a loop.
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(id.to_string());

        let mut current = self.folders.get(id).and_then(|f| f.parent.clone());
        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                tracing::error!("[FolderTree] Parent loop detected at {}", parent);
                break;
            }
            current = self.folders.get(&parent).and_then(|f| f.parent.clone());
            chain.push(parent);
        }
        chain
    }

    /// True if `ancestor` appears on the parent chain of `candidate`.
    pub fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        self.ancestors(candidate).iter().any(|a| a == ancestor)
    }

    /// Display names from the root down to `id`.
    pub fn folder_path(&self, id: &str) -> Vec<String> {
        if !self.folders.contains_key(id) {
            return Vec::new();
        }
        let mut names: Vec<String> = self.ancestors(id).iter().rev()
            .filter_map(|a| self.folders.get(a))
            .map(|f| f.name.clone())
            .collect();
        if let Some(folder) = self.folders.get(id) {
            names.push(folder.name.clone());
        }
        names
    }

    pub fn children_of(&self, id: &str) -> Vec<&Folder> {
        self.folders.get(id)
            .map(|f| f.children.iter().filter_map(|c| self.folders.get(c)).collect())
            .unwrap_or_default()
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` included.
    pub fn walk_subtree(&self, id: &str) -> Vec<&Folder> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(folder) = self.folders.get(current) else {
                continue;
            };
            stack.extend(folder.children.iter().rev().map(String::as_str));
            out.push(folder);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::core::model::*;

    fn folder(library: &mut Library, name: &str, parent: &str) -> String {
        library.create_folder(name, parent, DEFAULT_FOLDER_ICON).unwrap().id
    }

    #[test]
    fn create_folder_links_under_parent() {
        let mut library = Library::new();
        let papers = folder(&mut library, "Papers", ROOT_ID);
        let created = library.folder(&papers).unwrap();
        assert_eq!(created.name, "Papers");
        assert_eq!(created.kind, FolderKind::Folder);
        assert_eq!(created.parent.as_deref(), Some(ROOT_ID));
        assert!(library.root().unwrap().children.contains(&papers));
    }

    #[test]
    fn create_folder_rejects_unknown_parent() {
        let mut library = Library::new();
        let err = library.create_folder("x", "ghost", DEFAULT_FOLDER_ICON).unwrap_err();
        assert!(matches!(err, crate::error::LibraryError::InvalidParent(p) if p == "ghost"));
    }

    #[test]
    fn top_level_create_restores_root_in_order() {
        let mut library = Library::new();
        library.folder_order.clear();
        folder(&mut library, "Top", ROOT_ID);
        assert_eq!(library.folder_order, vec![ROOT_ID.to_string()]);
    }

    #[test]
    fn rename_folder_ignores_unknown_ids() {
        let mut library = Library::new();
        let id = folder(&mut library, "Old", ROOT_ID);
        assert!(library.rename_folder(&id, "New"));
        assert_eq!(library.folder(&id).unwrap().name, "New");
        assert!(!library.rename_folder("ghost", "New"));
    }

    #[test]
    fn move_folder_rejects_cycles() {
        let mut library = Library::new();
        let a = folder(&mut library, "a", ROOT_ID);
        let b = folder(&mut library, "b", &a);
        let c = folder(&mut library, "c", &b);
        let before = library.folders.clone();

        assert!(!library.move_folder(&a, &c));
        assert!(!library.move_folder(&a, &a));
        assert!(!library.move_folder(ROOT_ID, &a));
        assert_eq!(library.folders, before);

        assert!(library.move_folder(&c, &a));
        assert_eq!(library.folder(&c).unwrap().parent.as_deref(), Some(a.as_str()));
        assert!(!library.folder(&b).unwrap().children.contains(&c));
        assert!(library.folder(&a).unwrap().children.contains(&c));
    }

    #[test]
    fn delete_folder_moves_nested_files_to_unfiled() {
        let mut library = Library::new();
        let a = folder(&mut library, "a", ROOT_ID);
        let b = folder(&mut library, "b", &a);
        library.add_file("/top.pdf", "top.pdf", &a).unwrap();
        library.add_file("/deep.pdf", "deep.pdf", &b).unwrap();

        assert!(library.delete_folder(&a));
        assert!(library.folder(&a).is_none());
        assert!(library.folder(&b).is_none());
        assert!(!library.root().unwrap().children.contains(&a));

        let unfiled = library.folder(UNFILED_ID).unwrap();
        assert!(unfiled.files.contains(&"/top.pdf".to_string()));
        assert!(unfiled.files.contains(&"/deep.pdf".to_string()));
        assert_eq!(library.file("/deep.pdf").unwrap().folder, UNFILED_ID);
    }

    #[test]
    fn delete_folder_refuses_permanent_folders() {
        let mut library = Library::new();
        for id in [ROOT_ID, UNFILED_ID, TRASH_ID, PUBLICATIONS_ID, DUPLICATES_ID] {
            assert!(!library.delete_folder(id));
        }
        assert!(!library.delete_folder("ghost"));
    }

    #[test]
    fn delete_folder_rescues_special_folders_inside() {
        let mut library = Library::new();
        let a = folder(&mut library, "a", ROOT_ID);
        assert!(library.move_folder(TRASH_ID, &a));
        assert!(library.delete_folder(&a));

        let trash = library.folder(TRASH_ID).unwrap();
        assert_eq!(trash.parent.as_deref(), Some(ROOT_ID));
        assert!(library.root().unwrap().children.contains(&TRASH_ID.to_string()));
    }

    #[test]
    fn delete_folder_keeps_mislabelled_reserved_folder() {
        // Older snapshots could store a reserved id with the user-folder kind.
        let legacy = r#"{
            "folders": {
                "root":    { "id": "root", "name": "My Library", "kind": "library", "children": ["f1"] },
                "f1":      { "id": "f1", "name": "Box", "kind": "folder", "parent": "root",
                             "children": ["unfiled"], "files": ["/a.pdf"] },
                "unfiled": { "id": "unfiled", "name": "Unfiled Items", "kind": "folder", "parent": "f1" }
            },
            "files": { "/a.pdf": { "path": "/a.pdf", "name": "a.pdf", "folder": "f1" } },
            "folderOrder": ["root"]
        }"#;
        let mut library: Library = serde_json::from_str(legacy).unwrap();
        library.migrate();
        assert_eq!(library.folder(UNFILED_ID).unwrap().kind, FolderKind::Special);

        assert!(library.delete_folder("f1"));
        let unfiled = library.folder(UNFILED_ID).unwrap();
        assert_eq!(unfiled.parent.as_deref(), Some(ROOT_ID));
        assert_eq!(unfiled.files, vec!["/a.pdf".to_string()]);
        assert_eq!(library.file("/a.pdf").unwrap().folder, UNFILED_ID);
    }

    #[test]
    fn delete_folder_rescues_reserved_ids_even_without_migration() {
        let mut library = Library::new();
        let a = folder(&mut library, "a", ROOT_ID);
        assert!(library.move_folder(UNFILED_ID, &a));
        library.folders.get_mut(UNFILED_ID).unwrap().kind = FolderKind::Folder;
        library.add_file("/a.pdf", "a", &a).unwrap();

        assert!(library.delete_folder(&a));
        assert!(library.folder(UNFILED_ID).is_some());
        assert_eq!(library.file("/a.pdf").unwrap().folder, UNFILED_ID);
    }

    #[test]
    fn move_folder_rejects_unknown_parent() {
        let mut library = Library::new();
        let a = folder(&mut library, "a", ROOT_ID);
        let before = library.folders.clone();
        assert!(!library.move_folder(&a, "ghost"));
        assert!(!library.move_folder("ghost", &a));
        assert_eq!(library.folders, before);
    }

    #[test]
    fn rename_folder_rejects_blank_names() {
        let mut library = Library::new();
        let id = folder(&mut library, "Keep", ROOT_ID);
        assert!(!library.rename_folder(&id, "   "));
        assert_eq!(library.folder(&id).unwrap().name, "Keep");
    }

    #[test]
    fn create_folder_with_blank_name_uses_default() {
        let mut library = Library::new();
        let created = library.create_folder("  ", ROOT_ID, "").unwrap();
        assert_eq!(created.name, "New Folder");
        assert_eq!(created.icon, DEFAULT_FOLDER_ICON);
    }

    #[test]
    fn ancestors_end_at_root() {
        let mut library = Library::new();
        let a = folder(&mut library, "a", ROOT_ID);
        let b = folder(&mut library, "b", &a);
        assert_eq!(library.ancestors(&b), vec![a.clone(), ROOT_ID.to_string()]);
        assert_eq!(library.folder_path(&b), vec!["My Library", "a", "b"]);
        assert!(library.is_descendant(&b, ROOT_ID));
        assert!(!library.is_descendant(&a, &b));
    }

    #[test]
    fn ancestors_survive_corrupted_loops() {
        let mut library = Library::new();
        let a = folder(&mut library, "a", ROOT_ID);
        let b = folder(&mut library, "b", &a);
        library.folders.get_mut(&a).unwrap().parent = Some(b.clone());
        let chain = library.ancestors(&b);
        assert_eq!(chain, vec![a.clone()]);
    }

    #[test]
    fn walk_subtree_is_preorder() {
        let mut library = Library::new();
        let a = folder(&mut library, "a", ROOT_ID);
        let b = folder(&mut library, "b", &a);
        let c = folder(&mut library, "c", &a);
        let ids: Vec<&str> = library.walk_subtree(&a).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str(), c.as_str()]);
    }

    #[test]
    fn toggle_expanded_flips_flag() {
        let mut library = Library::new();
        let a = folder(&mut library, "a", ROOT_ID);
        assert!(library.toggle_expanded(&a));
        assert!(library.folder(&a).unwrap().expanded);
        assert!(library.toggle_expanded(&a));
        assert!(!library.folder(&a).unwrap().expanded);
        assert!(!library.toggle_expanded("ghost"));
    }
}
