//! Command-line interface definitions for upload-sitemap.
//!
//! The binary is a small standalone host around the library: it resolves
//! configuration, builds a [`SitemapProvider`](crate::sitemap::SitemapProvider),
//! and calls the provider the way a web application would.
//!
//! # Example
//!
//! ```bash
//! # Print the sitemap for an uploads directory
//! upload-sitemap --uploads-dir /srv/uploads --uploads-url https://example.com/uploads generate
//!
//! # Index line for a sitemap index, as JSON
//! upload-sitemap index
//!
//! # A PDF was uploaded: drop the cached sitemap
//! upload-sitemap notify --id 42 --kind application/pdf
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// XML sitemap generator for files in date-bucketed upload directories.
#[derive(Debug, Parser)]
#[command(name = "upload-sitemap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH", global = true, env = "UPLOAD_SITEMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Settings that take precedence over file and environment
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the sitemap document (cached when fresh)
    Generate(GenerateArgs),
    /// Print this sitemap's index entry as JSON
    Index,
    /// Scan the uploads directory and print matches as JSON, bypassing the cache
    Scan,
    /// Report a created or changed upload; clears the cache when the type matches
    Notify(NotifyArgs),
    /// Drop the cached sitemap
    ClearCache,
}

/// Arguments for the generate subcommand.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Write the document to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the notify subcommand.
#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Identifier of the changed item
    #[arg(long)]
    pub id: u64,

    /// Content type of the item, e.g. application/pdf
    #[arg(long, value_name = "MIME")]
    pub kind: String,
}

/// Command-line configuration overrides.
///
/// Serialized into the top figment layer; unset flags are skipped so they
/// do not mask lower layers.
#[derive(Debug, Default, Args, Serialize)]
pub struct ConfigOverrides {
    /// Uploads directory to scan
    #[arg(long, value_name = "DIR", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads_dir: Option<PathBuf>,

    /// Public URL of the uploads directory
    #[arg(long, value_name = "URL", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads_url: Option<String>,

    /// Site URL used for the index entry
    #[arg(long, value_name = "URL", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    /// Sitemap name (also the cache key)
    #[arg(long, value_name = "NAME", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap_name: Option<String>,

    /// File extension to include (repeatable; replaces the configured list)
    #[arg(long = "ext", value_name = "EXT", global = true)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_extensions: Vec<String>,

    /// Cache lifetime in seconds
    #[arg(long = "ttl", value_name = "SECONDS", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,

    /// SQLite cache file
    #[arg(long, value_name = "PATH", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    /// Keep the cache in memory only (every run rescans)
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "is_false")]
    pub no_cache: bool,

    /// Follow symlinked numeric directories
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "is_false")]
    pub follow_symlinks: bool,

    /// XSL stylesheet URL added to generated documents
    #[arg(long, value_name = "URL", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet_url: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}
