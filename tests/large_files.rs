use std::fs;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use junk_cleaner::{
    cancel_large_file_scan, delete_files, run_large_file_scan, scan_large_files, scan_photos,
    CleanerError, FileKind, LargeFileFilter, OperationRegistry, TimeWindow,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn fixture() -> TempDir {
    let dir = tempfile::Builder::new()
        .prefix("largescan")
        .tempdir()
        .expect("temp root");
    write(dir.path(), "media/big.mp4", 3000);
    write(dir.path(), "Download/setup.bin", 2000);
    write(dir.path(), "notes.txt", 10);
    write(dir.path(), "empty.txt", 0);
    write(dir.path(), ".hidden/secret.jpg", 5000);
    dir
}

fn write(root: &Path, relative: &str, size: usize) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(&path, vec![1u8; size]).expect("write file");
    path
}

#[test]
fn scan_lists_visible_non_empty_files_largest_first() {
    let dir = fixture();
    let files = scan_large_files(&[dir.path().to_path_buf()], &CancellationToken::new())
        .expect("scan should succeed");

    let summary: Vec<_> = files
        .iter()
        .map(|f| (f.name.as_str(), f.size, f.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("big.mp4", 3000, FileKind::Video),
            ("setup.bin", 2000, FileKind::Download),
            ("notes.txt", 10, FileKind::Docs),
        ]
    );
    assert!(files.iter().all(|f| f.modified.is_some() && !f.selected));
}

#[test]
fn overlapping_roots_do_not_duplicate_files() {
    let dir = fixture();
    let roots = vec![
        dir.path().to_path_buf(),
        dir.path().join("media"),
        dir.path().join("missing"),
    ];
    let files = scan_large_files(&roots, &CancellationToken::new()).expect("scan");
    assert_eq!(files.len(), 3);
}

#[test]
fn cancelled_scan_returns_error() {
    let dir = fixture();
    let token = CancellationToken::new();
    token.cancel();
    let result = scan_large_files(&[dir.path().to_path_buf()], &token);
    assert!(matches!(result, Err(CleanerError::Cancelled)));
}

#[test]
fn filters_narrow_scan_results() {
    let dir = fixture();
    let files = scan_large_files(&[dir.path().to_path_buf()], &CancellationToken::new())
        .expect("scan");

    let docs = LargeFileFilter {
        kind: Some(FileKind::Docs),
        ..LargeFileFilter::default()
    };
    assert_eq!(docs.apply(&files).len(), 1);

    let recent_and_big = LargeFileFilter {
        min_size: Some(ByteSize::b(2500)),
        modified_since: Some(TimeWindow::Day),
        ..LargeFileFilter::default()
    };
    let kept = recent_and_big.apply(&files);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].name, "big.mp4");
}

#[tokio::test]
async fn tracked_scan_and_delete() {
    let dir = fixture();
    let registry = OperationRegistry::default();
    assert!(!cancel_large_file_scan(&registry));

    let mut files = run_large_file_scan(&registry, vec![dir.path().to_path_buf()])
        .await
        .expect("scan should succeed");
    assert_eq!(files.len(), 3);

    files.retain(|f| f.kind == FileKind::Video);
    let report = delete_files(&files, |_| {});
    assert_eq!(report.deleted_count, 1);
    assert_eq!(report.deleted_bytes, 3000);
    assert!(!dir.path().join("media/big.mp4").exists());
    assert!(dir.path().join("notes.txt").exists());
}

#[test]
fn fresh_photos_are_grouped_under_today() {
    let dir = fixture();
    write(dir.path(), "DCIM/Camera/a.jpg", 4000);
    write(dir.path(), "DCIM/Camera/b.png", 1500);
    write(dir.path(), "DCIM/Camera/thumb.jpg", 100);

    let groups = scan_photos(
        &[dir.path().to_path_buf()],
        ByteSize::b(1024),
        &CancellationToken::new(),
    )
    .expect("photo scan should succeed");

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "Today");
    let mut names: Vec<_> = groups[0].photos.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["a.jpg", "b.png"]);
    assert_eq!(groups[0].total_size(), 5500);
    assert!(!groups[0].all_selected());
}

#[tokio::test]
async fn dropped_tracked_scan_releases_the_registry() {
    let dir = fixture();
    for i in 0..3000 {
        write(dir.path(), &format!("bulk{:02}/f{:04}.bin", i % 30, i), 64);
    }
    let registry = OperationRegistry::default();

    let outcome = tokio::time::timeout(
        std::time::Duration::ZERO,
        run_large_file_scan(&registry, vec![dir.path().to_path_buf()]),
    )
    .await;
    assert!(outcome.is_err());
    assert!(registry.list().is_empty());
    assert!(!cancel_large_file_scan(&registry));

    let files = run_large_file_scan(&registry, vec![dir.path().to_path_buf()])
        .await
        .expect("scan permit was released");
    assert_eq!(files.len(), 3003);
}
