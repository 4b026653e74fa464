//! SQLite-backed cache store.
//!
//! One row per sitemap name. The scan result is kept as JSON so the
//! schema does not change when [`CacheEntry`] grows a field.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::{CacheEntry, CacheStore, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sitemap_cache (
    key        TEXT PRIMARY KEY NOT NULL,
    payload    TEXT NOT NULL,
    expires_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
";

/// Persistent cache slots in a SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create a store at `path`, creating parent directories.
    ///
    /// Fails when the file exists but is not a usable database.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        log::debug!("Opened sitemap cache database at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Location of the database file, `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database connection lock poisoned".into()))?;
        f(&conn)
    }
}

impl CacheStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        self.with_conn(|conn| {
            let payload: Option<String> = conn
                .query_row(
                    "SELECT payload FROM sitemap_cache WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(payload) = payload else {
                return Ok(None);
            };

            match serde_json::from_str(&payload) {
                Ok(entry) => Ok(Some(entry)),
                Err(e) => {
                    // Treated as a miss; the next save overwrites the row
                    log::warn!("Discarding corrupt cache entry '{}': {}", key, e);
                    Ok(None)
                }
            }
        })
    }

    fn save(&self, key: &str, entry: &CacheEntry) -> Result<(), StoreError> {
        let payload = serde_json::to_string(entry)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sitemap_cache (key, payload, expires_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                     payload = excluded.payload,
                     expires_at = excluded.expires_at,
                     updated_at = excluded.updated_at",
                params![
                    key,
                    payload,
                    entry.expires_at.timestamp(),
                    entry.created_at.timestamp()
                ],
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM sitemap_cache WHERE key = ?1", params![key])?;
            Ok(removed > 0)
        })
    }
}
