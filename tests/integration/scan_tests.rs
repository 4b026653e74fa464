use filetime::{set_file_mtime, FileTime};
use std::fs::{self, File};
use std::path::Path;
use tempfile::tempdir;
use upload_sitemap::scanner::{DirectoryScanner, ScanConfig, ScanError, Scanner};

const ROOT_URL: &str = "https://example.com/wp-content/uploads";

fn touch(path: &Path, unix_secs: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap();
    set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0)).unwrap();
}

#[test]
fn test_scan_report_and_notes() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("2023/05/report.pdf"), 1_682_899_200);
    touch(&dir.path().join("notes.txt"), 1_682_899_200);

    let scanner = DirectoryScanner::new(ScanConfig::default());
    let result = scanner.scan(dir.path(), ROOT_URL).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.entries[0].url, format!("{ROOT_URL}/2023/05/report.pdf"));
    assert_eq!(result.entries[0].lastmod(), "2023-05-01T00:00:00Z");
    assert_eq!(result.latest_lastmod(), "2023-05-01T00:00:00Z");
}

#[test]
fn test_scan_latest_modified_is_maximum() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("2023/01/jan.pdf"), 1_672_531_200);
    touch(&dir.path().join("2023/06/jun.pdf"), 1_685_577_600);
    touch(&dir.path().join("2023/03/mar.pdf"), 1_677_628_800);

    let result = DirectoryScanner::new(ScanConfig::default())
        .scan(dir.path(), ROOT_URL)
        .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.latest_lastmod(), "2023-06-01T00:00:00Z");
}

#[test]
fn test_scan_skips_non_numeric_directories() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("2024/01/keep.pdf"), 1_704_067_200);
    touch(&dir.path().join("wpforms/skip.pdf"), 1_704_067_200);
    touch(&dir.path().join("2024/cache/skip.pdf"), 1_704_067_200);
    touch(&dir.path().join("2024.5/skip.pdf"), 1_704_067_200);

    let result = DirectoryScanner::new(ScanConfig::default())
        .scan(dir.path(), ROOT_URL)
        .unwrap();

    let urls: Vec<_> = result.entries.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(urls, vec![format!("{ROOT_URL}/2024/01/keep.pdf")]);
}

#[test]
fn test_scan_directory_with_matching_name_is_not_listed() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("bundle.pdf")).unwrap();
    touch(&dir.path().join("bundle.pdf/inner.pdf"), 1_704_067_200);

    let result = DirectoryScanner::new(ScanConfig::default())
        .scan(dir.path(), ROOT_URL)
        .unwrap();

    assert!(result.is_empty());
    assert!(result.latest_modified.is_none());
}

#[test]
fn test_scan_extension_case_and_allow_list() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("2024/01/UPPER.PDF"), 1_704_067_200);
    touch(&dir.path().join("2024/01/slides.pptx"), 1_704_067_200);
    touch(&dir.path().join("2024/01/photo.jpg"), 1_704_067_200);

    let config = ScanConfig::new(["pdf", "PPTX"]);
    let result = DirectoryScanner::new(config)
        .scan(dir.path(), ROOT_URL)
        .unwrap();

    let mut urls: Vec<_> = result.entries.iter().map(|e| e.url.clone()).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{ROOT_URL}/2024/01/UPPER.PDF"),
            format!("{ROOT_URL}/2024/01/slides.pptx"),
        ]
    );
}

#[test]
fn test_scan_percent_encodes_file_names() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("2024/02/Jahresbericht Ü&A.pdf"), 1_706_745_600);

    let result = DirectoryScanner::new(ScanConfig::default())
        .scan(dir.path(), &format!("{ROOT_URL}/"))
        .unwrap();

    assert_eq!(
        result.entries[0].url,
        format!("{ROOT_URL}/2024/02/Jahresbericht%20%C3%9C%26A.pdf")
    );
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let result = DirectoryScanner::new(ScanConfig::default())
        .scan(dir.path(), ROOT_URL)
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.latest_lastmod(), "");
}

#[test]
fn test_scan_missing_root() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let err = DirectoryScanner::new(ScanConfig::default())
        .scan(&missing, ROOT_URL)
        .unwrap_err();

    match err {
        ScanError::DirectoryUnreadable { path, .. } => assert_eq!(path, missing),
        other => panic!("Expected DirectoryUnreadable, got {:?}", other),
    }
}

#[test]
fn test_scan_root_is_a_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("uploads.pdf");
    touch(&file, 0);

    let err = DirectoryScanner::new(ScanConfig::default())
        .scan(&file, ROOT_URL)
        .unwrap_err();

    assert!(matches!(err, ScanError::NotADirectory(_)));
}

#[cfg(unix)]
#[test]
fn test_scan_unreadable_numeric_directory_fails() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("2024");
    touch(&locked.join("secret.pdf"), 0);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still list the directory; nothing to check then
    let still_readable = fs::read_dir(&locked).is_ok();
    let result = DirectoryScanner::new(ScanConfig::default()).scan(dir.path(), ROOT_URL);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if still_readable {
        return;
    }
    match result {
        Err(ScanError::DirectoryUnreadable { path, .. }) => assert_eq!(path, locked),
        other => panic!("Expected DirectoryUnreadable, got {:?}", other),
    }
}
