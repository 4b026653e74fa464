//! Path and URL helpers used while walking an upload tree.
//!
//! Upload folders created by the host are date buckets (`2024/05`), so
//! recursion is limited to names made only of ASCII digits. Every path
//! segment that ends up in a URL is escaped on its own, the way the
//! filesystem name is, so separators never appear inside a segment.
//!
//! # Example
//!
//! ```
//! use upload_sitemap::scanner::path_utils::{encode_segment, is_numeric_name};
//! use std::ffi::OsStr;
//!
//! assert!(is_numeric_name(OsStr::new("2024")));
//! assert!(!is_numeric_name(OsStr::new("2024-old")));
//! assert_eq!(encode_segment(OsStr::new("annual report.pdf")), "annual%20report.pdf");
//! ```

use std::ffi::OsStr;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Check whether a directory name is a date bucket (ASCII digits only).
#[must_use]
pub fn is_numeric_name(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
}

/// Check for the `.` and `..` pseudo-entries.
#[must_use]
pub fn is_dot_entry(name: &OsStr) -> bool {
    name == "." || name == ".."
}

/// Lower-cased text after the last `.` of a file name.
///
/// Returns `None` when there is no dot or nothing follows it. A leading dot
/// counts, so `.pdf` has the extension `pdf`.
#[must_use]
pub fn extension_of(name: &OsStr) -> Option<String> {
    let name = name.to_string_lossy();
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}

/// Normalize a configured extension: trim, drop a leading dot, lower-case.
#[must_use]
pub fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim();
    let ext = ext.strip_prefix('.').unwrap_or(ext).trim();
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Percent-encode one path segment (RFC 3986 unreserved characters pass through).
///
/// On Unix the raw name bytes are encoded, so names that are not valid UTF-8
/// still get a stable URL.
#[must_use]
pub fn encode_segment(name: &OsStr) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        urlencoding::encode_binary(name.as_bytes()).into_owned()
    }

    #[cfg(not(unix))]
    {
        urlencoding::encode(&name.to_string_lossy()).into_owned()
    }
}

/// Ensure a URL ends with exactly one `/`.
#[must_use]
pub fn with_trailing_slash(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}

/// Convert a filesystem time to UTC, dropping sub-second precision.
#[must_use]
pub fn to_utc_seconds(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time).trunc_subsecs(0)
}

/// W3C datetime used in `<lastmod>`, e.g. `2023-05-01T00:00:00Z`.
#[must_use]
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
