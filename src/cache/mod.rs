//! Cache slot storage for generated sitemaps.
//!
//! Each sitemap name owns one slot holding the last [`ScanResult`] and the
//! instant it stops being fresh. The cache never stores rendered XML, so a
//! changed entry transform or sort applies to cached results as well.
//!
//! # Architecture
//!
//! * [`entry`]: The stored value and its freshness check.
//! * [`store`]: The [`CacheStore`] backend trait and its error type.
//! * [`memory`]: Process-wide in-memory backend.
//! * [`database`]: SQLite backend that survives restarts.
//!
//! # Invalidation
//!
//! A slot is stale once `expires_at` has passed, or gone once the owner
//! removes it after a relevant upload. Either way the next read rebuilds it.
//!
//! [`ScanResult`]: crate::scanner::ScanResult

pub mod database;
pub mod entry;
pub mod memory;
pub mod store;

pub use database::SqliteStore;
pub use entry::CacheEntry;
pub use memory::MemoryStore;
pub use store::{CacheStore, StoreError};
