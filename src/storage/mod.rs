// FILE: src/storage/mod.rs
pub mod connection;
pub mod repository;
pub mod snapshot;

// Common exports
pub use repository::Repository;
pub use connection::{open_database, open_in_memory};
pub use snapshot::{MemoryStore, SnapshotStore, SqliteStore, LIBRARY_KEY};
