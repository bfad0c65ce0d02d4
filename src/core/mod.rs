// FILE: src/core/mod.rs
pub mod model;
pub mod tags;
pub mod folder_tree;
pub mod file_index;

pub use model::{
    Library, Folder, FolderKind, FileEntry,
    ROOT_ID, PUBLICATIONS_ID, DUPLICATES_ID, UNFILED_ID, TRASH_ID,
    DEFAULT_FOLDER_ICON, SCHEMA_VERSION, is_reserved_id,
};
pub use tags::{Tag, TagColor, TagOwner, VocabularyScope, normalize_tag_name};
pub use file_index::{TrashReport, TrashError};
