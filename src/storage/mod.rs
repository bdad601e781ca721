//! Storage module for persisting extracted page text
//!
//! This module handles:
//! - SQLite database initialization and schema management
//! - Keeping the latest text per `{host}{route}` key

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqlitePageStore;
pub use traits::{PageStore, StorageError, StorageResult, StoredPage};

use std::path::Path;

/// Opens or creates a page store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqlitePageStore)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_storage(path: &Path) -> StorageResult<SqlitePageStore> {
    SqlitePageStore::open(path)
}
