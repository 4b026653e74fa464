//! Filesystem capability used by the scanner.
//!
//! The walker only needs to list one directory at a time and learn, for
//! each child, its name, whether it is a directory, and when it last
//! changed. [`EntrySource`] captures exactly that, so the same walk runs
//! against the real disk ([`DiskSource`]) or a fixture ([`MemorySource`]).

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use walkdir::WalkDir;

use super::ScanError;

/// What a directory child is, as far as the walker cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file (or a symlink to one)
    File,
    /// Directory that may be descended into
    Directory,
    /// Anything else: sockets, devices, unfollowed directory links
    Other,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// File name (last path component)
    pub name: OsString,
    /// Entry type
    pub kind: EntryKind,
    /// Modification time, or the best fallback the source could find
    pub modified: SystemTime,
}

/// Directory listing capability.
pub trait EntrySource: Send + Sync {
    /// Fail unless `dir` exists and is a directory.
    fn ensure_dir(&self, dir: &Path) -> Result<(), ScanError>;

    /// List the children of `dir`, sorted by name.
    fn read_dir(&self, dir: &Path) -> Result<Vec<SourceEntry>, ScanError>;

    /// Identity used to detect directories reached twice through links.
    fn canonical_dir(&self, dir: &Path) -> PathBuf {
        dir.to_path_buf()
    }
}

/// [`EntrySource`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSource {
    follow_symlinks: bool,
}

impl DiskSource {
    /// Create a disk source.
    ///
    /// Symlinked directories are reported as [`EntryKind::Directory`] only
    /// when `follow_symlinks` is set.
    #[must_use]
    pub fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }

    fn unreadable(path: &Path, source: io::Error) -> ScanError {
        ScanError::DirectoryUnreadable {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl EntrySource for DiskSource {
    fn ensure_dir(&self, dir: &Path) -> Result<(), ScanError> {
        let metadata = fs::metadata(dir).map_err(|e| Self::unreadable(dir, e))?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(ScanError::NotADirectory(dir.to_path_buf()))
        }
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<SourceEntry>, ScanError> {
        let mut entries = Vec::new();

        let listing = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for item in listing {
            let item = match item {
                Ok(item) => item,
                // Depth 0 means the directory itself could not be opened
                Err(e) if e.depth() == 0 => {
                    return Err(Self::unreadable(dir, io::Error::from(e)));
                }
                Err(e) => {
                    log::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            // Resolve through links so a linked PDF is still a file
            let metadata = match fs::metadata(item.path()) {
                Ok(m) => m,
                Err(e) => {
                    log::debug!("Skipping {}: {}", item.path().display(), e);
                    continue;
                }
            };

            let kind = if metadata.is_dir() {
                if item.path_is_symlink() && !self.follow_symlinks {
                    log::trace!("Not following directory link: {}", item.path().display());
                    EntryKind::Other
                } else {
                    EntryKind::Directory
                }
            } else if metadata.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };

            entries.push(SourceEntry {
                name: item.file_name().to_os_string(),
                kind,
                modified: resolve_modified(&metadata),
            });
        }

        Ok(entries)
    }

    fn canonical_dir(&self, dir: &Path) -> PathBuf {
        fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
    }
}

/// Modification time, falling back to creation and then status-change time.
fn resolve_modified(metadata: &Metadata) -> SystemTime {
    metadata
        .modified()
        .or_else(|_| metadata.created())
        .ok()
        .or_else(|| status_changed(metadata))
        .unwrap_or(UNIX_EPOCH)
}

#[cfg(unix)]
fn status_changed(metadata: &Metadata) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    u64::try_from(metadata.ctime())
        .ok()
        .map(|secs| UNIX_EPOCH + Duration::from_secs(secs))
}

#[cfg(not(unix))]
fn status_changed(_metadata: &Metadata) -> Option<SystemTime> {
    None
}

/// In-memory directory tree.
///
/// Paths given to the builder methods are relative to `root`; missing
/// parent directories are created on the fly.
///
/// ```
/// use upload_sitemap::scanner::{DirectoryScanner, MemorySource, ScanConfig, Scanner};
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let source = MemorySource::new("/uploads")
///     .with_file("2023/05/report.pdf", UNIX_EPOCH + Duration::from_secs(1_682_899_200))
///     .with_file("notes.txt", UNIX_EPOCH);
/// let scanner = DirectoryScanner::with_source(source, ScanConfig::default());
/// let result = scanner.scan("/uploads".as_ref(), "https://example.com/uploads").unwrap();
///
/// assert_eq!(result.entries[0].url, "https://example.com/uploads/2023/05/report.pdf");
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    root: PathBuf,
    nodes: BTreeMap<PathBuf, (EntryKind, SystemTime)>,
    unreadable: BTreeSet<PathBuf>,
}

impl MemorySource {
    /// Create an empty tree rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            nodes: BTreeMap::new(),
            unreadable: BTreeSet::new(),
        }
    }

    /// Add a regular file.
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>, modified: SystemTime) -> Self {
        self.with_node(path.as_ref(), EntryKind::File, modified)
    }

    /// Add an (empty) directory.
    #[must_use]
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.with_node(path.as_ref(), EntryKind::Directory, UNIX_EPOCH)
    }

    /// Add a directory whose listing fails.
    #[must_use]
    pub fn with_unreadable_dir(mut self, path: impl AsRef<Path>) -> Self {
        let full = self.root.join(path.as_ref());
        self = self.with_node(path.as_ref(), EntryKind::Directory, UNIX_EPOCH);
        self.unreadable.insert(full);
        self
    }

    fn with_node(mut self, relative: &Path, kind: EntryKind, modified: SystemTime) -> Self {
        let full = self.root.join(relative);
        let mut parent = full.parent();
        while let Some(dir) = parent {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            self.nodes
                .entry(dir.to_path_buf())
                .or_insert((EntryKind::Directory, UNIX_EPOCH));
            parent = dir.parent();
        }
        self.nodes.insert(full, (kind, modified));
        self
    }

    fn is_dir(&self, dir: &Path) -> bool {
        dir == self.root
            || matches!(self.nodes.get(dir), Some((EntryKind::Directory, _)))
    }
}

impl EntrySource for MemorySource {
    fn ensure_dir(&self, dir: &Path) -> Result<(), ScanError> {
        if self.is_dir(dir) {
            Ok(())
        } else if self.nodes.contains_key(dir) {
            Err(ScanError::NotADirectory(dir.to_path_buf()))
        } else {
            Err(ScanError::DirectoryUnreadable {
                path: dir.to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
        }
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<SourceEntry>, ScanError> {
        self.ensure_dir(dir)?;
        if self.unreadable.contains(dir) {
            return Err(ScanError::DirectoryUnreadable {
                path: dir.to_path_buf(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }

        let mut entries: Vec<SourceEntry> = self
            .nodes
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .filter_map(|(path, (kind, modified))| {
                path.file_name().map(|name| SourceEntry {
                    name: name.to_os_string(),
                    kind: *kind,
                    modified: *modified,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
