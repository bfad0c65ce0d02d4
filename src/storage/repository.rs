// FILE: src/storage/repository.rs
use rusqlite::{Connection, OptionalExtension, params};
use crate::error::{Result, LibraryError};

/// Key-value access to the `kv_store` table.
pub struct Repository<'a> {
    conn: &'a Connection,
}

impl<'a> Repository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
        "#).map_err(LibraryError::Database)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(LibraryError::Database)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(LibraryError::Database)?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::connection::open_in_memory;

    #[test]
    fn set_overwrites_and_remove_reports() {
        let conn = open_in_memory().unwrap();
        let repo = Repository::new(&conn);

        assert_eq!(repo.get("library").unwrap(), None);
        repo.set("library", "one").unwrap();
        repo.set("library", "two").unwrap();
        assert_eq!(repo.get("library").unwrap().as_deref(), Some("two"));

        assert!(repo.remove("library").unwrap());
        assert!(!repo.remove("library").unwrap());
        assert_eq!(repo.get("library").unwrap(), None);
    }
}
