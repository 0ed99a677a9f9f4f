// src/junk_cleaner/executor.rs

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::types::{CleanProgress, CleanReport, JunkFile};
use crate::ops::ThroughputTracker;

/// Anything the executor can remove: a path plus the size recorded at scan time.
pub trait Deletable {
    fn path(&self) -> &str;
    fn size(&self) -> u64;
}

impl Deletable for JunkFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Delete every item in order, reporting progress after each one.
///
/// Failures (already gone, permission denied, not a regular file) are skipped
/// and only show up as the gap between `attempted` and `deleted_count`.
/// Freed bytes use the recorded size, not a fresh stat.
pub fn delete_files<T, F>(items: &[T], mut on_progress: F) -> CleanReport
where
    T: Deletable,
    F: FnMut(&CleanProgress),
{
    let mut report = CleanReport {
        attempted: items.len(),
        ..CleanReport::default()
    };
    let mut tracker = ThroughputTracker::default();
    tracker.tick(0, 0, items.len() as u64);

    for (i, item) in items.iter().enumerate() {
        match remove_file(Path::new(item.path())) {
            Ok(()) => {
                report.deleted_count += 1;
                report.deleted_bytes += item.size();
            }
            Err(err) => {
                log::debug!("Failed to remove {}: {}", item.path(), err);
            }
        }

        let (eta_ms, files_per_s, mb_per_s) = tracker.tick(
            (i + 1) as u64,
            report.deleted_bytes,
            items.len() as u64,
        );
        on_progress(&CleanProgress {
            processed: i + 1,
            total: items.len(),
            deleted_bytes: report.deleted_bytes,
            current_path: item.path().to_string(),
            eta_ms,
            files_per_s,
            mb_per_s,
        });
    }

    report
}

fn remove_file(path: &Path) -> std::io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        return Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            "refusing to remove a directory",
        ));
    }
    fs::remove_file(path)
}
