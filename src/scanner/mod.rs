//! Scanner module for upload directory traversal.
//!
//! This module provides functionality for:
//! - Walking an upload root and its numerically named subdirectories
//! - Filtering files by an extension allow-list
//! - Resolving public URLs and W3C timestamps for every match
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`source`]: Filesystem capability trait with disk and in-memory implementations
//! - [`walker`]: The recursive [`DirectoryScanner`]
//! - [`path_utils`]: Name checks, URL segment escaping, timestamp formatting
//!
//! # Example
//!
//! ```no_run
//! use upload_sitemap::scanner::{DirectoryScanner, ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let scanner = DirectoryScanner::new(ScanConfig::default());
//! let result = scanner
//!     .scan(Path::new("/var/www/uploads"), "https://example.com/uploads")
//!     .unwrap();
//! for entry in &result.entries {
//!     println!("{} {}", entry.url, entry.lastmod());
//! }
//! ```

pub mod path_utils;
pub mod source;
pub mod walker;

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Re-export main types
pub use source::{DiskSource, EntryKind, EntrySource, MemorySource, SourceEntry};
pub use walker::DirectoryScanner;

/// Extension listed when nothing else is configured.
pub const DEFAULT_EXTENSION: &str = "pdf";

/// A file that made it into the sitemap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute, percent-encoded URL of the file
    pub url: String,
    /// Last modification time, truncated to whole seconds
    pub modified_at: DateTime<Utc>,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(url: impl Into<String>, modified_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            modified_at,
        }
    }

    /// The `<lastmod>` rendering of [`FileEntry::modified_at`].
    #[must_use]
    pub fn lastmod(&self) -> String {
        path_utils::format_timestamp(&self.modified_at)
    }
}

/// Everything a single scan found.
///
/// `entries` keeps discovery order; sitemap output is a sorted view of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Matching files in discovery order
    pub entries: Vec<FileEntry>,
    /// Newest `modified_at` across `entries`, `None` when nothing matched
    pub latest_modified: Option<DateTime<Utc>>,
}

impl ScanResult {
    /// Append an entry, keeping `latest_modified` up to date.
    pub fn push(&mut self, entry: FileEntry) {
        if self
            .latest_modified
            .is_none_or(|latest| entry.modified_at > latest)
        {
            self.latest_modified = Some(entry.modified_at);
        }
        self.entries.push(entry);
    }

    /// Number of matched files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no file matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `latest_modified` formatted for an index `<lastmod>`; empty when no files.
    #[must_use]
    pub fn latest_lastmod(&self) -> String {
        self.latest_modified
            .as_ref()
            .map(path_utils::format_timestamp)
            .unwrap_or_default()
    }
}

/// Configuration for directory scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Lower-cased extensions without a leading dot.
    allowed_extensions: BTreeSet<String>,

    /// Descend into symlinked numeric directories.
    /// Cycles are cut by remembering every canonical directory visited.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: BTreeSet::from([DEFAULT_EXTENSION.to_string()]),
            follow_symlinks: false,
        }
    }
}

impl ScanConfig {
    /// Create a configuration from a list of extensions.
    ///
    /// Extensions are trimmed, stripped of a leading `.`, and lower-cased;
    /// empty values are dropped.
    #[must_use]
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_extensions = extensions
            .into_iter()
            .filter_map(|ext| path_utils::normalize_extension(ext.as_ref()))
            .collect();
        Self {
            allowed_extensions,
            follow_symlinks: false,
        }
    }

    /// Enable or disable following symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// The normalized allow-list.
    #[must_use]
    pub fn allowed_extensions(&self) -> &BTreeSet<String> {
        &self.allowed_extensions
    }

    /// Check whether a file name carries an allowed extension.
    #[must_use]
    pub fn allows(&self, name: &OsStr) -> bool {
        path_utils::extension_of(name)
            .is_some_and(|ext| self.allowed_extensions.contains(&ext))
    }

    /// Check whether a content kind (usually a MIME type) belongs to one of
    /// the allowed extensions, e.g. `application/pdf` for `pdf`.
    #[must_use]
    pub fn matches_kind(&self, kind: &str) -> bool {
        let kind = kind.to_lowercase();
        self.allowed_extensions
            .iter()
            .any(|ext| kind.contains(ext.as_str()))
    }
}

/// Anything that can turn an upload root into a [`ScanResult`].
///
/// [`DirectoryScanner`] is the real implementation; the trait is the seam the
/// sitemap cache calls through.
pub trait Scanner: Send + Sync {
    /// Scan `root_dir`, whose public location is `root_url`.
    fn scan(&self, root_dir: &Path, root_url: &str) -> Result<ScanResult, ScanError>;
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A directory could not be opened or listed.
    #[error("Directory unreadable: {path}: {source}")]
    DirectoryUnreadable {
        /// Directory that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The scan root exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl ScanError {
    /// The directory the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::DirectoryUnreadable { path, .. } | Self::NotADirectory(path) => path,
        }
    }
}
