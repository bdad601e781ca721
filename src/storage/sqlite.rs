//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the PageStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageStore, StorageError, StorageResult, StoredPage};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite page store shared by all fetches
#[derive(Debug)]
pub struct SqlitePageStore {
    conn: Mutex<Connection>,
}

impl SqlitePageStore {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl PageStore for SqlitePageStore {
    fn store(&self, key: &str, host: &str, route: &str, text: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO pages (key, host, route, text, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                host = excluded.host,
                route = excluded.route,
                text = excluded.text,
                stored_at = excluded.stored_at",
            params![key, host, route, text, now],
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<StoredPage>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT key, host, route, text, stored_at FROM pages WHERE key = ?1")?;

        let page = stmt
            .query_row(params![key], |row| {
                Ok(StoredPage {
                    key: row.get(0)?,
                    host: row.get(1)?,
                    route: row.get(2)?,
                    text: row.get(3)?,
                    stored_at: row.get(4)?,
                })
            })
            .optional()?;

        Ok(page)
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
