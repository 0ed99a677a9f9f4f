// src/junk_cleaner/large_files.rs

use std::fs;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use walkdir::{DirEntry, WalkDir};

#[cfg(feature = "parallel-scan")]
use dashmap::DashMap;
#[cfg(feature = "parallel-scan")]
use rayon::prelude::*;
#[cfg(not(feature = "parallel-scan"))]
use std::collections::HashSet;

use super::executor::Deletable;
use crate::error::{CleanerError, Result};
use crate::ops::{OpGuard, OperationKind, OperationRegistry, OperationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Docs,
    Download,
    Archive,
    Other,
}

impl FileKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            FileKind::Image => "Image",
            FileKind::Video => "Video",
            FileKind::Audio => "Audio",
            FileKind::Docs => "Docs",
            FileKind::Download => "Download",
            FileKind::Archive => "Archive",
            FileKind::Other => "Other",
        }
    }

    /// Extension first, then where the file lives.
    pub fn detect(path: &str, name: &str) -> FileKind {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if let Some(kind) = Self::from_extension(&ext) {
            return kind;
        }

        let lower = path.to_lowercase();
        if lower.contains("download") {
            FileKind::Download
        } else if ["dcim", "pictures", "camera"].iter().any(|t| lower.contains(t)) {
            FileKind::Image
        } else if ["movies", "video"].iter().any(|t| lower.contains(t)) {
            FileKind::Video
        } else if ["music", "audio"].iter().any(|t| lower.contains(t)) {
            FileKind::Audio
        } else if lower.contains("documents") {
            FileKind::Docs
        } else {
            FileKind::Other
        }
    }

    fn from_extension(ext: &str) -> Option<FileKind> {
        let kind = match ext {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "tiff" | "svg" => FileKind::Image,
            "mp4" | "avi" | "mkv" | "mov" | "3gp" | "wmv" | "flv" | "webm" | "m4v" => {
                FileKind::Video
            }
            "mp3" | "wav" | "aac" | "flac" | "ogg" | "wma" | "m4a" => FileKind::Audio,
            "pdf" | "doc" | "docx" | "txt" | "xls" | "xlsx" | "ppt" | "pptx" | "rtf" => {
                FileKind::Docs
            }
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" => FileKind::Archive,
            "apk" | "exe" | "deb" | "dmg" => FileKind::Other,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeFile {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub kind: FileKind,
    pub modified: Option<DateTime<Utc>>,
    pub selected: bool,
}

impl Deletable for LargeFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Minimum-size choices offered for large-file filtering.
pub fn size_presets() -> [ByteSize; 6] {
    [
        ByteSize::mib(10),
        ByteSize::mib(20),
        ByteSize::mib(50),
        ByteSize::mib(100),
        ByteSize::mib(200),
        ByteSize::mib(500),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    Day,
    Week,
    Month,
    Quarter,
}

impl TimeWindow {
    pub fn days(&self) -> i64 {
        match self {
            TimeWindow::Day => 1,
            TimeWindow::Week => 7,
            TimeWindow::Month => 30,
            TimeWindow::Quarter => 90,
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - ChronoDuration::days(self.days())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LargeFileFilter {
    pub kind: Option<FileKind>,
    pub min_size: Option<ByteSize>,
    pub modified_since: Option<TimeWindow>,
}

impl LargeFileFilter {
    pub fn matches(&self, file: &LargeFile, now: DateTime<Utc>) -> bool {
        if self.kind.is_some_and(|k| k != file.kind) {
            return false;
        }
        if self.min_size.is_some_and(|min| file.size < min.as_u64()) {
            return false;
        }
        match (self.modified_since, file.modified) {
            (Some(window), Some(modified)) => modified >= window.cutoff(now),
            // unknown mtime never passes a time filter
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Filtered copy, order preserved.
    pub fn apply(&self, files: &[LargeFile]) -> Vec<LargeFile> {
        let now = Utc::now();
        files
            .iter()
            .filter(|f| self.matches(f, now))
            .cloned()
            .collect()
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

fn to_large_file(entry: &DirEntry) -> Option<(PathBuf, LargeFile)> {
    if !entry.file_type().is_file() {
        return None;
    }
    let metadata = match entry.metadata() {
        Ok(m) => m,
        Err(err) => {
            log::debug!("Cannot stat {}: {}", entry.path().display(), err);
            return None;
        }
    };
    if metadata.len() == 0 {
        return None;
    }
    let canonical = fs::canonicalize(entry.path()).ok()?;
    let name = entry.file_name().to_string_lossy().into_owned();
    let path = entry.path().to_string_lossy().into_owned();
    let file = LargeFile {
        kind: FileKind::detect(&path, &name),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        size: metadata.len(),
        selected: false,
        name,
        path,
    };
    Some((canonical, file))
}

fn walk_root(root: &Path) -> impl Iterator<Item = DirEntry> + Send {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden_dir(e))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::debug!("Skipping entry: {}", err);
                None
            }
        })
}

/// Every non-empty regular file under `roots`, largest first.
///
/// Hidden directories below a root are skipped, symlinks are not followed and
/// a file reachable from several roots is listed once.
pub fn scan_large_files(roots: &[PathBuf], cancel: &CancellationToken) -> Result<Vec<LargeFile>> {
    let mut files = collect_files(roots, cancel);
    if cancel.is_cancelled() {
        return Err(CleanerError::Cancelled);
    }
    files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

#[cfg(feature = "parallel-scan")]
fn collect_files(roots: &[PathBuf], cancel: &CancellationToken) -> Vec<LargeFile> {
    let found: DashMap<PathBuf, LargeFile> = DashMap::new();
    for root in roots.iter().filter(|r| r.is_dir()) {
        if cancel.is_cancelled() {
            break;
        }
        walk_root(root).par_bridge().for_each(|entry| {
            if cancel.is_cancelled() {
                return;
            }
            if let Some((canonical, file)) = to_large_file(&entry) {
                found.entry(canonical).or_insert(file);
            }
        });
    }
    found.into_iter().map(|(_, file)| file).collect()
}

#[cfg(not(feature = "parallel-scan"))]
fn collect_files(roots: &[PathBuf], cancel: &CancellationToken) -> Vec<LargeFile> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for root in roots.iter().filter(|r| r.is_dir()) {
        for entry in walk_root(root) {
            if cancel.is_cancelled() {
                return files;
            }
            if let Some((canonical, file)) = to_large_file(&entry) {
                if seen.insert(canonical) {
                    files.push(file);
                }
            }
        }
    }
    files
}

/// [`scan_large_files`] on the blocking pool, tracked in `registry`.
///
/// Shares the scan guard with junk scans.
pub async fn run_large_file_scan(
    registry: &OperationRegistry,
    roots: Vec<PathBuf>,
) -> Result<Vec<LargeFile>> {
    let _permit = registry
        .scan_sem
        .clone()
        .try_acquire_owned()
        .map_err(|_| CleanerError::ScanInProgress)?;

    let (op_id, token) = registry.register(OperationKind::LargeFileScan, true);
    registry.update(&op_id, |s| {
        s.status = OperationStatus::Running;
        s.stage = "scanning".into();
    });

    let mut op = OpGuard::new(registry, &op_id, &token);

    let outcome = tokio::task::spawn_blocking(move || scan_large_files(&roots, &token)).await;
    op.disarm();
    match outcome {
        Ok(Ok(files)) => {
            registry.finish_success(&op_id);
            let total: u64 = files.iter().map(|f| f.size).sum();
            log::info!("Large file scan found {} files ({})", files.len(), ByteSize(total));
            Ok(files)
        }
        Ok(Err(CleanerError::Cancelled)) => {
            registry.finish_canceled(&op_id);
            Err(CleanerError::Cancelled)
        }
        Ok(Err(err)) => {
            registry.finish_failed(&op_id, &err.to_string());
            Err(err)
        }
        Err(join_err) => {
            registry.finish_failed(&op_id, &join_err.to_string());
            Err(join_err.into())
        }
    }
}

pub fn cancel_large_file_scan(registry: &OperationRegistry) -> bool {
    registry
        .active(&OperationKind::LargeFileScan)
        .iter()
        .fold(false, |any, id| registry.cancel(id) || any)
}
