use filetime::{set_file_mtime, FileTime};
use std::fs::{self, File};
use std::path::Path;
use tempfile::tempdir;
use upload_sitemap::cli::ConfigOverrides;
use upload_sitemap::config::Config;
use upload_sitemap::sitemap::{xml, CACHE_MARKER};

fn touch(path: &Path, unix_secs: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap();
    set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0)).unwrap();
}

fn config_for(uploads: &Path, cache_path: Option<&Path>) -> Config {
    Config {
        uploads_dir: Some(uploads.to_path_buf()),
        uploads_url: Some("https://example.com/wp-content/uploads".to_string()),
        cache_path: cache_path.map(Path::to_path_buf),
        no_cache: cache_path.is_none(),
        ..Config::default()
    }
}

#[test]
fn test_newest_first_document() {
    let uploads = tempdir().unwrap();
    touch(&uploads.path().join("2023/01/jan.pdf"), 1_672_531_200);
    touch(&uploads.path().join("2023/06/jun.pdf"), 1_685_577_600);

    let provider = upload_sitemap::build_provider(&config_for(uploads.path(), None)).unwrap();
    let sitemap = provider.sitemap().unwrap();

    let expected = "<urlset xmlns=\"https://www.sitemaps.org/schemas/sitemap/0.9\">\n\
        <url>\n\
        \t<loc>https://example.com/wp-content/uploads/2023/06/jun.pdf</loc>\n\
        \t<lastmod>2023-06-01T00:00:00Z</lastmod>\n\
        </url>\n\
        <url>\n\
        \t<loc>https://example.com/wp-content/uploads/2023/01/jan.pdf</loc>\n\
        \t<lastmod>2023-01-01T00:00:00Z</lastmod>\n\
        </url>\n\
        </urlset>";
    assert_eq!(sitemap.document, expected);
    assert_eq!(sitemap.lastmod(), "2023-06-01T00:00:00Z");

    let again = provider.sitemap().unwrap();
    assert!(again.from_cache);
    assert!(again.document.starts_with(CACHE_MARKER));
    assert_eq!(again.urlset(), expected);
}

#[test]
fn test_index_entry_follows_cache_state() {
    let uploads = tempdir().unwrap();
    touch(&uploads.path().join("2023/05/report.pdf"), 1_682_899_200);

    let provider = upload_sitemap::build_provider(&config_for(uploads.path(), None)).unwrap();
    assert_eq!(provider.index_entry().lastmod, None);
    assert_eq!(
        provider.index_entry().loc,
        "https://example.com/pdf_files-sitemap.xml"
    );

    provider.sitemap().unwrap();
    assert_eq!(
        provider.index_entry().lastmod.as_deref(),
        Some("2023-05-01T00:00:00Z")
    );

    assert!(provider.clear_cache());
    assert_eq!(provider.index_entry().lastmod, None);
    assert!(!provider.clear_cache());
}

#[test]
fn test_content_change_clears_persistent_cache() {
    let uploads = tempdir().unwrap();
    let state = tempdir().unwrap();
    let db = state.path().join("cache.db");
    touch(&uploads.path().join("2024/01/a.pdf"), 1_704_067_200);

    let config = config_for(uploads.path(), Some(&db));
    let provider = upload_sitemap::build_provider(&config).unwrap();
    provider.sitemap().unwrap();

    touch(&uploads.path().join("2024/02/b.pdf"), 1_706_745_600);
    assert!(!provider.sitemap().unwrap().document.contains("b.pdf"));

    // A second host process sharing the database sees the same slot
    let other = upload_sitemap::build_provider(&config).unwrap();
    assert!(!other.on_content_changed(10, "image/png"));
    assert!(other.on_content_changed(11, "application/pdf"));

    let rebuilt = provider.sitemap().unwrap();
    assert!(!rebuilt.from_cache);
    assert!(rebuilt.document.contains("2024/02/b.pdf"));
}

#[test]
fn test_corrupt_cache_file_degrades_to_memory() {
    let uploads = tempdir().unwrap();
    let state = tempdir().unwrap();
    let db = state.path().join("cache.db");
    fs::write(&db, "not a database, only plain text\n".repeat(128)).unwrap();
    touch(&uploads.path().join("2024/01/a.pdf"), 1_704_067_200);

    let provider = upload_sitemap::build_provider(&config_for(uploads.path(), Some(&db))).unwrap();

    assert!(!provider.sitemap().unwrap().from_cache);
    assert!(provider.sitemap().unwrap().from_cache);
}

#[test]
fn test_missing_uploads_dir_serves_empty_document() {
    let state = tempdir().unwrap();
    let provider =
        upload_sitemap::build_provider(&config_for(&state.path().join("gone"), None)).unwrap();

    assert!(provider.sitemap().is_err());
    assert_eq!(provider.sitemap_document(), xml::urlset(&[]));
    assert_eq!(provider.index_entry().lastmod, None);
}

#[test]
fn test_extension_override_from_cli_layer() {
    let uploads = tempdir().unwrap();
    touch(&uploads.path().join("2024/01/a.pdf"), 1_704_067_200);
    touch(&uploads.path().join("2024/01/b.docx"), 1_704_153_600);

    let overrides = ConfigOverrides {
        uploads_dir: Some(uploads.path().to_path_buf()),
        uploads_url: Some("https://example.com/uploads".to_string()),
        allowed_extensions: vec!["docx".to_string()],
        no_cache: true,
        ..ConfigOverrides::default()
    };
    let missing = uploads.path().join("absent.toml");
    let config = Config::load(Some(&missing), &overrides).unwrap();
    let provider = upload_sitemap::build_provider(&config).unwrap();

    let result = provider.scan().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.entries[0].url, "https://example.com/uploads/2024/01/b.docx");

    provider.sitemap().unwrap();
    assert!(!provider.on_content_changed(3, "application/pdf"));
    assert!(provider.on_content_changed(4, "application/x-docx"));
}
