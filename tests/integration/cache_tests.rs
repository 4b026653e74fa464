use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use filetime::{set_file_mtime, FileTime};
use std::fs::{self, File};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use upload_sitemap::cache::{CacheStore, SqliteStore};
use upload_sitemap::scanner::{DirectoryScanner, ScanConfig};
use upload_sitemap::sitemap::{SitemapCache, CACHE_MARKER, DEFAULT_CACHE_TTL};

const ROOT_URL: &str = "https://example.com/uploads";

fn touch(path: &Path, unix_secs: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap();
    set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0)).unwrap();
}

#[test]
fn test_cache_survives_reopening_database() {
    let uploads = tempdir().unwrap();
    let state = tempdir().unwrap();
    let db_path = state.path().join("nested/cache.db");
    touch(&uploads.path().join("2023/05/report.pdf"), 1_682_899_200);
    let scanner = DirectoryScanner::new(ScanConfig::default());

    let first = {
        let store = Arc::new(SqliteStore::open(&db_path).unwrap());
        let cache = SitemapCache::new(store, DEFAULT_CACHE_TTL);
        cache
            .get_sitemap("pdf_files", &scanner, uploads.path(), ROOT_URL)
            .unwrap()
    };
    assert!(!first.from_cache);
    assert!(db_path.exists());

    // New file after the first build must not show up until the entry expires
    touch(&uploads.path().join("2023/06/later.pdf"), 1_685_577_600);

    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    let cache = SitemapCache::new(store, DEFAULT_CACHE_TTL);
    let second = cache
        .get_sitemap("pdf_files", &scanner, uploads.path(), ROOT_URL)
        .unwrap();

    assert!(second.from_cache);
    assert_eq!(second.document, format!("{}{}", CACHE_MARKER, first.document));
    assert_eq!(second.lastmod(), "2023-05-01T00:00:00Z");
}

#[test]
fn test_sqlite_entry_expires_with_clock() {
    let uploads = tempdir().unwrap();
    touch(&uploads.path().join("2024/01/a.pdf"), 1_704_067_200);
    let scanner = DirectoryScanner::new(ScanConfig::default());

    let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let now = Arc::new(Mutex::new(start));
    let clock = Arc::clone(&now);
    let cache = SitemapCache::new(
        Arc::new(SqliteStore::open_in_memory().unwrap()),
        Duration::from_secs(3600),
    )
    .with_clock(move || *clock.lock().unwrap());

    let built = cache
        .get_sitemap("pdf_files", &scanner, uploads.path(), ROOT_URL)
        .unwrap();
    assert!(!built.from_cache);

    *now.lock().unwrap() = start + ChronoDuration::minutes(59);
    assert!(cache
        .get_sitemap("pdf_files", &scanner, uploads.path(), ROOT_URL)
        .unwrap()
        .from_cache);

    *now.lock().unwrap() = start + ChronoDuration::hours(1);
    touch(&uploads.path().join("2024/02/b.pdf"), 1_706_745_600);
    let rebuilt = cache
        .get_sitemap("pdf_files", &scanner, uploads.path(), ROOT_URL)
        .unwrap();
    assert!(!rebuilt.from_cache);
    assert_eq!(rebuilt.lastmod(), "2024-02-01T00:00:00Z");
    assert!(rebuilt.document.contains("2024/02/b.pdf"));
}

#[test]
fn test_zero_ttl_always_rescans() {
    let uploads = tempdir().unwrap();
    touch(&uploads.path().join("2024/01/a.pdf"), 1_704_067_200);
    let scanner = DirectoryScanner::new(ScanConfig::default());
    let cache = SitemapCache::new(
        Arc::new(SqliteStore::open_in_memory().unwrap()),
        Duration::ZERO,
    );

    let first = cache
        .get_sitemap("pdf_files", &scanner, uploads.path(), ROOT_URL)
        .unwrap();
    touch(&uploads.path().join("2024/01/b.pdf"), 1_704_153_600);
    let second = cache
        .get_sitemap("pdf_files", &scanner, uploads.path(), ROOT_URL)
        .unwrap();

    assert!(!first.from_cache);
    assert!(!second.from_cache);
    assert!(second.document.contains("2024/01/b.pdf"));
}

#[test]
fn test_scan_failure_leaves_slot_empty() {
    let state = tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&state.path().join("cache.db")).unwrap());
    let cache = SitemapCache::new(Arc::clone(&store) as Arc<dyn CacheStore>, DEFAULT_CACHE_TTL);
    let scanner = DirectoryScanner::new(ScanConfig::default());

    let missing = state.path().join("no-uploads");
    assert!(cache
        .get_sitemap("pdf_files", &scanner, &missing, ROOT_URL)
        .is_err());
    assert!(store.load("pdf_files").unwrap().is_none());
}

#[test]
fn test_garbage_database_file_fails_to_open() {
    let state = tempdir().unwrap();
    let path = state.path().join("cache.db");
    fs::write(&path, "this is not a sqlite database\n".repeat(128)).unwrap();

    assert!(SqliteStore::open(&path).is_err());
}

#[test]
fn test_empty_tree_document() {
    let uploads = tempdir().unwrap();
    let scanner = DirectoryScanner::new(ScanConfig::default());
    let cache = SitemapCache::new(
        Arc::new(SqliteStore::open_in_memory().unwrap()),
        DEFAULT_CACHE_TTL,
    );

    let sitemap = cache
        .get_sitemap("pdf_files", &scanner, uploads.path(), ROOT_URL)
        .unwrap();

    assert_eq!(
        sitemap.document,
        "<urlset xmlns=\"https://www.sitemaps.org/schemas/sitemap/0.9\">\n</urlset>"
    );
    assert_eq!(sitemap.lastmod(), "");
}
