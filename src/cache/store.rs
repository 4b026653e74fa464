//! Backend trait for cache slots.

use std::path::PathBuf;

use super::CacheEntry;

/// Errors raised by a cache backend.
///
/// Callers treat every variant the same way: the slot is unusable for
/// this request and the sitemap is rebuilt from disk.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The backend cannot be reached at all.
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    /// SQLite reported an error.
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An entry could not be encoded for storage.
    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),

    /// The store location could not be prepared.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Key/value storage for [`CacheEntry`] values.
///
/// Reads and writes replace whole entries, so a reader sees either the old
/// or the new value, never a mix.
pub trait CacheStore: Send + Sync {
    /// Fetch the entry stored under `key`, fresh or not.
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Store `entry` under `key`, replacing any previous value.
    fn save(&self, key: &str, entry: &CacheEntry) -> Result<(), StoreError>;

    /// Drop the entry under `key`. Returns whether one existed.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;
}
