//! Host-facing sitemap provider.
//!
//! An embedding application builds one [`SitemapProvider`] per sitemap and
//! calls it directly: to serve the document, to contribute a line to the
//! sitemap index, and to report new uploads so the cache can be dropped.

use std::path::PathBuf;

use serde::Serialize;

use super::{xml, Sitemap, SitemapCache, SitemapError};
use crate::scanner::{
    path_utils, DirectoryScanner, ScanConfig, ScanError, ScanResult, Scanner,
};

/// Name under which the default sitemap is registered.
pub const DEFAULT_SITEMAP_NAME: &str = "pdf_files";

/// Where uploads live on disk and where they are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    /// Upload base directory
    pub dir: PathBuf,
    /// Public URL mirroring `dir`
    pub url: String,
}

impl StorageRoot {
    /// Create a storage root.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url: url.into(),
        }
    }
}

/// One `<sitemap>` line in a sitemap index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Public location of this sitemap
    pub loc: String,
    /// Newest file time of the stored scan, if there is one
    pub lastmod: Option<String>,
}

/// A named sitemap over one storage root.
pub struct SitemapProvider {
    name: String,
    site_url: String,
    root: StorageRoot,
    config: ScanConfig,
    scanner: Box<dyn Scanner>,
    cache: SitemapCache,
}

impl std::fmt::Debug for SitemapProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitemapProvider")
            .field("name", &self.name)
            .field("site_url", &self.site_url)
            .field("root", &self.root)
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl SitemapProvider {
    /// Create a provider scanning `root` on disk.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        site_url: impl Into<String>,
        root: StorageRoot,
        config: ScanConfig,
        cache: SitemapCache,
    ) -> Self {
        let scanner = Box::new(DirectoryScanner::new(config.clone()));
        Self {
            name: name.into(),
            site_url: site_url.into(),
            root,
            config,
            scanner,
            cache,
        }
    }

    /// Swap in a different scanner, e.g. one over a [`MemorySource`].
    ///
    /// [`MemorySource`]: crate::scanner::MemorySource
    #[must_use]
    pub fn with_scanner(mut self, scanner: impl Scanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    /// Registered sitemap name, also the cache key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The storage root being scanned.
    #[must_use]
    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// Cached or freshly built sitemap.
    ///
    /// # Errors
    ///
    /// Fails only when a rebuild is needed and the upload tree cannot be read.
    pub fn sitemap(&self) -> Result<Sitemap, SitemapError> {
        self.cache
            .get_sitemap(&self.name, self.scanner.as_ref(), &self.root.dir, &self.root.url)
    }

    /// The sitemap document, degrading to an empty `<urlset>` on failure.
    #[must_use]
    pub fn sitemap_document(&self) -> String {
        match self.sitemap() {
            Ok(sitemap) => sitemap.document,
            Err(e) => {
                log::error!("Serving empty sitemap '{}': {}", self.name, e);
                xml::urlset(&[])
            }
        }
    }

    /// Scan the storage root without touching the cache.
    ///
    /// # Errors
    ///
    /// Returns the scanner's error when the tree cannot be read.
    pub fn scan(&self) -> Result<ScanResult, ScanError> {
        self.scanner.scan(&self.root.dir, &self.root.url)
    }

    /// Public URL of this sitemap, `<site>/<name>-sitemap.xml`.
    #[must_use]
    pub fn sitemap_url(&self) -> String {
        format!(
            "{}{}-sitemap.xml",
            path_utils::with_trailing_slash(&self.site_url),
            self.name
        )
    }

    /// Index line for this sitemap.
    ///
    /// Only reads the cache: `lastmod` is `None` until a scan has been
    /// stored and is still fresh, or when that scan found nothing.
    #[must_use]
    pub fn index_entry(&self) -> IndexEntry {
        let lastmod = self
            .cache
            .fresh_entry(&self.name)
            .and_then(|entry| entry.result.latest_modified)
            .map(|time| path_utils::format_timestamp(&time));

        IndexEntry {
            loc: self.sitemap_url(),
            lastmod,
        }
    }

    /// Report that content `id` of type `kind` was created or changed.
    ///
    /// Drops the cached sitemap when `kind` (usually a MIME type) mentions
    /// one of the allowed extensions. Returns whether the cache was cleared.
    pub fn on_content_changed(&self, id: u64, kind: &str) -> bool {
        if !self.config.matches_kind(kind) {
            log::trace!("Ignoring change to {} ({})", id, kind);
            return false;
        }
        log::info!("Content {} ({}) changed, clearing sitemap '{}'", id, kind, self.name);
        self.cache.invalidate(&self.name)
    }

    /// Drop the cached sitemap unconditionally.
    pub fn clear_cache(&self) -> bool {
        self.cache.invalidate(&self.name)
    }
}
