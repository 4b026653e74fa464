//! Structured error handling and exit codes.

use serde::Serialize;

use crate::config::ConfigError;
use crate::scanner::ScanError;
use crate::sitemap::SitemapError;

/// Exit codes for the upload-sitemap binary.
///
/// - 0: Success
/// - 1: General error (unexpected failure)
/// - 2: Scan failed (upload directory missing or unreadable)
/// - 3: Configuration error (bad or missing settings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: The command completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Scan failed: The upload tree could not be read.
    ScanFailed = 2,
    /// Configuration error: Settings were invalid or incomplete.
    ConfigError = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "US000",
            Self::GeneralError => "US001",
            Self::ScanFailed => "US002",
            Self::ConfigError => "US003",
        }
    }

    /// Pick the exit code for an application error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.is::<ScanError>() || cause.is::<SitemapError>() {
                return Self::ScanFailed;
            }
            if cause.is::<ConfigError>() {
                return Self::ConfigError;
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "US002")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
