//! upload-sitemap - XML sitemaps for uploaded files
//!
//! Walks a date-bucketed uploads directory (`2024/05/...`), collects files
//! whose extension is on an allow-list (PDFs by default), and renders them
//! as a `<urlset>` sitemap, newest first. Results are cached per sitemap
//! name for a configurable time and dropped early when a matching upload
//! is reported.
//!
//! The [`sitemap::SitemapProvider`] is the entry point for embedding
//! applications; the `upload-sitemap` binary is a thin host around it.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod scanner;
pub mod sitemap;

use std::fs;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cache::{CacheStore, MemoryStore, SqliteStore};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::ExitCode;
use crate::sitemap::{xml, SitemapCache, SitemapProvider};

/// Run the command described by `cli`.
///
/// Logging must already be initialised.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref(), &cli.overrides)?;
    config.validate()?;

    let provider = build_provider(&config)?;

    match cli.command {
        Commands::Generate(args) => {
            let sitemap = provider
                .sitemap()
                .with_context(|| format!("Failed to build sitemap '{}'", provider.name()))?;
            let document = xml::render_document(&sitemap.document, config.stylesheet_url.as_deref());

            match args.output {
                Some(path) => {
                    fs::write(&path, &document)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    log::info!("Wrote sitemap to {}", path.display());
                }
                None => io::stdout()
                    .write_all(document.as_bytes())
                    .context("Failed to write sitemap to stdout")?,
            }
        }
        Commands::Index => {
            println!("{}", serde_json::to_string_pretty(&provider.index_entry())?);
        }
        Commands::Scan => {
            let result = provider
                .scan()
                .with_context(|| format!("Failed to scan {}", provider.root().dir.display()))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Notify(args) => {
            if provider.on_content_changed(args.id, &args.kind) {
                log::info!("Cleared cached sitemap '{}'", provider.name());
            } else {
                log::info!("Sitemap '{}' unchanged", provider.name());
            }
        }
        Commands::ClearCache => {
            let removed = provider.clear_cache();
            log::info!(
                "{} cached sitemap '{}'",
                if removed { "Removed" } else { "No" },
                provider.name()
            );
        }
    }

    Ok(ExitCode::Success)
}

/// Assemble the provider described by `config`.
///
/// An unusable SQLite cache falls back to the in-memory store.
pub fn build_provider(config: &Config) -> Result<SitemapProvider> {
    let root = config.storage_root()?;
    let site_url = config.resolved_site_url()?;
    let cache = SitemapCache::new(open_store(config), config.cache_ttl());

    Ok(SitemapProvider::new(
        config.sitemap_name.clone(),
        site_url,
        root,
        config.scan_config(),
        cache,
    ))
}

fn open_store(config: &Config) -> Arc<dyn CacheStore> {
    let Some(path) = config.cache_location() else {
        log::debug!("Using in-memory sitemap cache");
        return Arc::new(MemoryStore::new());
    };

    match SqliteStore::open(&path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::warn!(
                "Cache at {} unavailable, continuing without it: {}",
                path.display(),
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}
