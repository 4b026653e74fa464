//! Cached sitemap generation.
//!
//! [`SitemapCache`] sits between callers and a [`Scanner`]: a fresh stored
//! result is rendered directly, anything else triggers one scan whose
//! result is stored for the configured TTL. Rendering always runs the
//! optional entry transform, then sorts newest first.
//!
//! Concurrent misses on the same key are collapsed: one caller scans, the
//! others wait and then read what it stored.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use upload_sitemap::cache::MemoryStore;
//! use upload_sitemap::scanner::{DirectoryScanner, ScanConfig};
//! use upload_sitemap::sitemap::{SitemapCache, DEFAULT_CACHE_TTL};
//!
//! let cache = SitemapCache::new(Arc::new(MemoryStore::new()), DEFAULT_CACHE_TTL);
//! let scanner = DirectoryScanner::new(ScanConfig::default());
//! let sitemap = cache
//!     .get_sitemap("pdf_files", &scanner, Path::new("/srv/uploads"), "https://example.com/uploads")
//!     .unwrap();
//! println!("{}", sitemap.document);
//! ```

pub mod provider;
pub mod xml;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::{CacheEntry, CacheStore};
use crate::scanner::{path_utils, FileEntry, ScanError, ScanResult, Scanner};

pub use provider::{IndexEntry, SitemapProvider, StorageRoot};

/// Comment placed before documents rendered from a stored result.
pub const CACHE_MARKER: &str = "<!-- Served from cache -->\n";

/// How long a stored scan stays fresh unless configured otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Hook that may add, drop, or reorder entries before sorting.
pub type EntryTransform = Arc<dyn Fn(Vec<FileEntry>) -> Vec<FileEntry> + Send + Sync>;

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Errors that can occur while producing a sitemap.
///
/// Cache backend failures never appear here: they are logged and the
/// sitemap is rebuilt without the cache.
#[derive(thiserror::Error, Debug)]
pub enum SitemapError {
    /// The upload tree could not be scanned.
    #[error("Failed to scan uploads: {0}")]
    Scan(#[from] ScanError),
}

/// A rendered sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sitemap {
    /// The serialized document, including [`CACHE_MARKER`] when cached
    pub document: String,
    /// Newest modification time of the stored result
    pub latest_modified: Option<DateTime<Utc>>,
    /// Whether the stored result was reused
    pub from_cache: bool,
}

impl Sitemap {
    /// The `<urlset>` part of the document, without the cache marker.
    #[must_use]
    pub fn urlset(&self) -> &str {
        self.document
            .strip_prefix(CACHE_MARKER)
            .unwrap_or(&self.document)
    }

    /// `latest_modified` as a W3C datetime, empty when there are no files.
    #[must_use]
    pub fn lastmod(&self) -> String {
        self.latest_modified
            .as_ref()
            .map(path_utils::format_timestamp)
            .unwrap_or_default()
    }
}

/// Cache-or-rebuild sitemap generator.
pub struct SitemapCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    transform: Option<EntryTransform>,
    clock: Clock,
    rebuild_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for SitemapCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitemapCache")
            .field("ttl", &self.ttl)
            .field("transform", &self.transform.is_some())
            .finish_non_exhaustive()
    }
}

impl SitemapCache {
    /// Create a cache over `store` whose entries live for `ttl`.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            transform: None,
            clock: Arc::new(Utc::now),
            rebuild_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Install the entry transform hook.
    #[must_use]
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Vec<FileEntry>) -> Vec<FileEntry> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Replace the clock used for expiry decisions.
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Produce the sitemap for `key`, scanning only when no fresh entry exists.
    ///
    /// # Errors
    ///
    /// Returns [`SitemapError::Scan`] when a rebuild is needed and the scan
    /// fails. Nothing is stored in that case.
    pub fn get_sitemap(
        &self,
        key: &str,
        scanner: &dyn Scanner,
        root_dir: &Path,
        root_url: &str,
    ) -> Result<Sitemap, SitemapError> {
        if let Some(entry) = self.fresh_entry(key) {
            log::debug!("Sitemap '{}' served from cache", key);
            return Ok(self.render(&entry.result, true));
        }

        let lock = self.rebuild_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have rebuilt the slot while we waited
        if let Some(entry) = self.fresh_entry(key) {
            log::debug!("Sitemap '{}' rebuilt by a concurrent caller", key);
            return Ok(self.render(&entry.result, true));
        }

        log::debug!("Rebuilding sitemap '{}' from {}", key, root_dir.display());
        let result = scanner.scan(root_dir, root_url).map_err(|e| {
            log::error!("Sitemap '{}' scan failed: {}", key, e);
            e
        })?;

        let entry = CacheEntry::new(result, (self.clock)(), self.ttl);
        if let Err(e) = self.store.save(key, &entry) {
            log::warn!("Could not store sitemap '{}', serving uncached: {}", key, e);
        }

        Ok(self.render(&entry.result, false))
    }

    /// The stored entry for `key` if it is still fresh.
    ///
    /// Backend failures are logged and reported as `None`.
    #[must_use]
    pub fn fresh_entry(&self, key: &str) -> Option<CacheEntry> {
        match self.store.load(key) {
            Ok(Some(entry)) if entry.is_fresh((self.clock)()) => Some(entry),
            Ok(Some(entry)) => {
                log::debug!("Sitemap '{}' expired at {}", key, entry.expires_at);
                None
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Cache store unavailable for '{}', rebuilding: {}", key, e);
                None
            }
        }
    }

    /// Drop the stored entry for `key`. Returns whether one was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(removed) => {
                log::debug!("Invalidated sitemap '{}' (had entry: {})", key, removed);
                removed
            }
            Err(e) => {
                log::warn!("Could not invalidate sitemap '{}': {}", key, e);
                false
            }
        }
    }

    fn rebuild_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .rebuild_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    fn render(&self, result: &ScanResult, from_cache: bool) -> Sitemap {
        let mut entries = result.entries.clone();
        if let Some(transform) = &self.transform {
            entries = transform(entries);
        }
        // Stable: equal timestamps keep their relative order
        entries.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

        let body = xml::urlset(&entries);
        let document = if from_cache {
            format!("{CACHE_MARKER}{body}")
        } else {
            body
        };

        Sitemap {
            document,
            latest_modified: result.latest_modified,
            from_cache,
        }
    }
}
