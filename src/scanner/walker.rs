//! Recursive upload-directory walker.
//!
//! # Overview
//!
//! [`DirectoryScanner`] lists the upload root, descends into every child
//! directory whose name is all digits (the host's `YYYY/MM` buckets), and
//! records each regular file whose extension is on the allow-list. Other
//! directories are left alone: the host never writes uploads there.
//!
//! Each match gets a URL built from the root URL plus one escaped segment
//! per directory level, and a timestamp from its modification time.
//!
//! # Example
//!
//! ```no_run
//! use upload_sitemap::scanner::{DirectoryScanner, ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let scanner = DirectoryScanner::new(ScanConfig::new(["pdf", "docx"]));
//! let result = scanner
//!     .scan(Path::new("/srv/uploads"), "https://example.com/uploads")
//!     .unwrap();
//! println!("{} files, newest {}", result.len(), result.latest_lastmod());
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::path_utils::{
    encode_segment, is_dot_entry, is_numeric_name, to_utc_seconds, with_trailing_slash,
};
use super::source::{DiskSource, EntryKind, EntrySource};
use super::{FileEntry, ScanConfig, ScanError, ScanResult, Scanner};

/// Walks an upload root and collects allow-listed files.
#[derive(Debug, Clone)]
pub struct DirectoryScanner<S = DiskSource> {
    /// Where directory listings come from
    source: S,
    /// Scanner configuration
    config: ScanConfig,
}

impl DirectoryScanner<DiskSource> {
    /// Create a scanner over the local filesystem.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            source: DiskSource::new(config.follow_symlinks),
            config,
        }
    }
}

impl<S: EntrySource> DirectoryScanner<S> {
    /// Create a scanner over any [`EntrySource`].
    #[must_use]
    pub fn with_source(source: S, config: ScanConfig) -> Self {
        Self { source, config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Recurse into `dir`, appending matches to `result`.
    ///
    /// Any directory that fails to list aborts the whole scan.
    fn walk_dir(
        &self,
        dir: &Path,
        url: &str,
        visited: &mut HashSet<PathBuf>,
        result: &mut ScanResult,
    ) -> Result<(), ScanError> {
        let url = with_trailing_slash(url);

        for entry in self.source.read_dir(dir)? {
            if is_dot_entry(&entry.name) {
                continue;
            }

            match entry.kind {
                EntryKind::Directory if is_numeric_name(&entry.name) => {
                    let child = dir.join(&entry.name);
                    if !visited.insert(self.source.canonical_dir(&child)) {
                        log::debug!("Skipping already visited directory: {}", child.display());
                        continue;
                    }
                    let child_url = format!("{url}{}", encode_segment(&entry.name));
                    self.walk_dir(&child, &child_url, visited, result)?;
                }
                EntryKind::Directory => {
                    log::trace!(
                        "Skipping non-numeric directory: {}",
                        dir.join(&entry.name).display()
                    );
                }
                EntryKind::File if self.config.allows(&entry.name) => {
                    let file_url = format!("{url}{}", encode_segment(&entry.name));
                    log::trace!("Matched {}", file_url);
                    result.push(FileEntry::new(file_url, to_utc_seconds(entry.modified)));
                }
                EntryKind::File | EntryKind::Other => {}
            }
        }

        Ok(())
    }
}

impl<S: EntrySource> Scanner for DirectoryScanner<S> {
    fn scan(&self, root_dir: &Path, root_url: &str) -> Result<ScanResult, ScanError> {
        self.source.ensure_dir(root_dir)?;

        let mut visited = HashSet::from([self.source.canonical_dir(root_dir)]);
        let mut result = ScanResult::default();
        self.walk_dir(root_dir, root_url, &mut visited, &mut result)?;

        log::debug!(
            "Scanned {}: {} matching files, newest {:?}",
            root_dir.display(),
            result.len(),
            result.latest_modified
        );
        Ok(result)
    }
}
