// src/junk_cleaner/photos.rs

use std::path::PathBuf;

use bytesize::ByteSize;
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::large_files::{scan_large_files, FileKind, LargeFile};
use crate::error::Result;

/// Photos taken on one local calendar day, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoGroup {
    pub label: String,
    pub date: NaiveDate,
    pub photos: Vec<LargeFile>,
}

impl PhotoGroup {
    pub fn total_size(&self) -> u64 {
        self.photos.iter().map(|p| p.size).sum()
    }

    pub fn selected_size(&self) -> u64 {
        self.photos.iter().filter(|p| p.selected).map(|p| p.size).sum()
    }

    /// Non-empty and every photo selected.
    pub fn all_selected(&self) -> bool {
        !self.photos.is_empty() && self.photos.iter().all(|p| p.selected)
    }

    pub fn set_all_selected(&mut self, selected: bool) {
        for photo in &mut self.photos {
            photo.selected = selected;
        }
    }

    /// Flip one photo's selection; `false` when the path is not in this group.
    pub fn toggle_photo(&mut self, path: &str) -> bool {
        match self.photos.iter_mut().find(|p| p.path == path) {
            Some(photo) => {
                photo.selected = !photo.selected;
                true
            }
            None => false,
        }
    }
}

/// "Today", "Yesterday", else e.g. "Mar 05, 2026".
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_string()
    } else {
        date.format("%b %d, %Y").to_string()
    }
}

/// Group images larger than `min_size` by the local day they were last
/// modified. Groups and the photos inside them run newest first; files without
/// a modification time are left out.
pub fn group_photos_by_day(
    files: &[LargeFile],
    min_size: ByteSize,
    now: DateTime<Local>,
) -> Vec<PhotoGroup> {
    let today = now.date_naive();
    let mut photos: Vec<(DateTime<Local>, &LargeFile)> = files
        .iter()
        .filter(|f| f.kind == FileKind::Image && f.size > min_size.as_u64())
        .filter_map(|f| f.modified.map(|m| (m.with_timezone(&Local), f)))
        .collect();
    photos.sort_by(|a, b| b.0.cmp(&a.0));

    let mut groups: Vec<PhotoGroup> = Vec::new();
    for (modified, photo) in photos {
        let date = modified.date_naive();
        match groups.last_mut() {
            Some(group) if group.date == date => group.photos.push(photo.clone()),
            _ => groups.push(PhotoGroup {
                label: day_label(date, today),
                date,
                photos: vec![photo.clone()],
            }),
        }
    }
    groups
}

/// Scan `roots` and group the images found by day.
pub fn scan_photos(
    roots: &[PathBuf],
    min_size: ByteSize,
    cancel: &CancellationToken,
) -> Result<Vec<PhotoGroup>> {
    let files = scan_large_files(roots, cancel)?;
    let groups = group_photos_by_day(&files, min_size, Local::now());
    log::debug!("Grouped photos into {} days", groups.len());
    Ok(groups)
}
