// FILE: src/engine/mod.rs
pub mod importer;
pub mod searcher;

pub use importer::{FileDescriptor, ImportResult, Importer, SkippedFile};
pub use searcher::Searcher;
