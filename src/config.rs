//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file (`--config`, or the platform config directory)
//! 3. `UPLOAD_SITEMAP_*` environment variables
//! 4. Command-line flags
//!
//! ```toml
//! uploads_dir = "/var/www/html/wp-content/uploads"
//! uploads_url = "https://example.com/wp-content/uploads"
//! site_url = "https://example.com"
//! allowed_extensions = ["pdf", "docx"]
//! cache_ttl_secs = 3600
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::ConfigOverrides;
use crate::scanner::ScanConfig;
use crate::sitemap::provider::{StorageRoot, DEFAULT_SITEMAP_NAME};
use crate::sitemap::DEFAULT_CACHE_TTL;

/// Prefix for environment overrides, e.g. `UPLOAD_SITEMAP_CACHE_TTL_SECS`.
pub const ENV_PREFIX: &str = "UPLOAD_SITEMAP_";

/// Errors raised while loading or checking configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A layer could not be read or did not match the schema.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    /// A required setting has no value in any layer.
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// A setting has a value that cannot be used.
    #[error("Invalid value for {key}: {reason}")]
    Invalid {
        /// Setting name
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upload base directory to scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads_dir: Option<PathBuf>,

    /// Public URL of `uploads_dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads_url: Option<String>,

    /// Site root used for the index `loc`; defaults to the origin of `uploads_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    /// Sitemap name and cache key.
    pub sitemap_name: String,

    /// File extensions to list.
    pub allowed_extensions: Vec<String>,

    /// Seconds a stored scan stays fresh.
    pub cache_ttl_secs: u64,

    /// SQLite cache file; defaults to the platform cache directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    /// Keep the cache in memory only.
    pub no_cache: bool,

    /// Descend into symlinked numeric directories.
    pub follow_symlinks: bool,

    /// XSL stylesheet referenced from generated documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uploads_dir: None,
            uploads_url: None,
            site_url: None,
            sitemap_name: DEFAULT_SITEMAP_NAME.to_string(),
            allowed_extensions: vec![crate::scanner::DEFAULT_EXTENSION.to_string()],
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            cache_path: None,
            no_cache: false,
            follow_symlinks: false,
            stylesheet_url: None,
        }
    }
}

impl Config {
    /// Load all layers, using `path` instead of the default file when given.
    ///
    /// A missing file is not an error; the remaining layers still apply.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let file = path.map(Path::to_path_buf).or_else(Self::default_path);
        if let Some(file) = &file {
            if file.exists() {
                log::debug!("Loading configuration from {}", file.display());
            } else if path.is_some() {
                log::warn!("Config file {} not found, using defaults", file.display());
            }
        }

        let config: Self = Self::figment(file.as_deref())
            .merge(Serialized::defaults(overrides))
            .extract()?;
        Ok(config)
    }

    /// Defaults, file, and environment layers (no CLI flags).
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default config file location for this platform.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Default SQLite cache location for this platform.
    #[must_use]
    pub fn default_cache_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.cache_dir().join("sitemap-cache.db"))
    }

    /// Check that the settings can drive a scan.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_config().allowed_extensions().is_empty() {
            return Err(ConfigError::Invalid {
                key: "allowed_extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        if self.sitemap_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "sitemap_name",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(url) = &self.uploads_url {
            parse_http_url("uploads_url", url)?;
        }
        if let Some(url) = &self.site_url {
            parse_http_url("site_url", url)?;
        }
        if let Some(url) = &self.stylesheet_url {
            parse_http_url("stylesheet_url", url)?;
        }
        Ok(())
    }

    /// Scanner settings derived from this configuration.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new(&self.allowed_extensions).with_follow_symlinks(self.follow_symlinks)
    }

    /// Cache time-to-live.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Upload directory and URL, both required.
    pub fn storage_root(&self) -> Result<StorageRoot, ConfigError> {
        let dir = self
            .uploads_dir
            .clone()
            .ok_or(ConfigError::Missing("uploads_dir"))?;
        let url = self
            .uploads_url
            .clone()
            .ok_or(ConfigError::Missing("uploads_url"))?;
        Ok(StorageRoot::new(dir, url))
    }

    /// Site URL, falling back to the origin of `uploads_url`.
    pub fn resolved_site_url(&self) -> Result<String, ConfigError> {
        if let Some(site) = &self.site_url {
            return Ok(site.clone());
        }
        let uploads = self
            .uploads_url
            .as_deref()
            .ok_or(ConfigError::Missing("site_url"))?;
        let url = parse_http_url("uploads_url", uploads)?;
        Ok(url.origin().ascii_serialization())
    }

    /// SQLite file to use, `None` when the cache is memory-only.
    #[must_use]
    pub fn cache_location(&self) -> Option<PathBuf> {
        if self.no_cache {
            None
        } else {
            self.cache_path.clone().or_else(Self::default_cache_path)
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "upload-sitemap", "upload-sitemap")
}

fn parse_http_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("'{value}' is not an absolute URL ({e})"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
