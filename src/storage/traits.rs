//! Storage traits and error types
//!
//! This module defines the interface the fetch pipeline uses to persist
//! extracted page text.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A page as persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    pub key: String,
    pub host: String,
    pub route: String,
    pub text: String,
    /// RFC 3339 timestamp of the last store
    pub stored_at: String,
}

/// Trait for page text backends
///
/// Implementations are shared by every fetch in flight and must be safe to
/// call from several tasks at once.
pub trait PageStore: Send + Sync {
    /// Stores the text of a page, replacing any earlier version
    ///
    /// # Arguments
    ///
    /// * `key` - `{host}{route}` of the page as fetched
    /// * `host` - The effective host after redirects
    /// * `route` - The requested route
    /// * `text` - The extracted text
    fn store(&self, key: &str, host: &str, route: &str, text: &str) -> StorageResult<()>;

    /// Gets a stored page by key
    fn get(&self, key: &str) -> StorageResult<Option<StoredPage>>;

    /// Counts stored pages
    fn count(&self) -> StorageResult<u64>;
}
