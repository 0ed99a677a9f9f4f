// src/junk_cleaner/storage.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sysinfo::Disks;

use super::roots::storage_root;
use crate::config::ScanConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
}

impl StorageUsage {
    pub fn new(mount_point: PathBuf, total_bytes: u64, available_bytes: u64) -> Self {
        StorageUsage {
            mount_point,
            total_bytes,
            available_bytes,
            used_bytes: total_bytes.saturating_sub(available_bytes),
        }
    }

    pub fn used_percent(&self) -> u32 {
        if self.total_bytes == 0 {
            return 0;
        }
        ((self.used_bytes as u128 * 100) / self.total_bytes as u128) as u32
    }
}

/// Total and free space of the disk that holds `root`.
///
/// `None` when no mounted disk contains the path.
pub fn storage_usage(root: &Path) -> Option<StorageUsage> {
    let target = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let disks = Disks::new_with_refreshed_list();
    let list = disks.list();
    let mounts: Vec<&Path> = list.iter().map(|d| d.mount_point()).collect();
    let Some(index) = containing_mount(&target, &mounts) else {
        log::debug!("No disk found for {}", target.display());
        return None;
    };
    let disk = &list[index];
    Some(StorageUsage::new(
        disk.mount_point().to_path_buf(),
        disk.total_space(),
        disk.available_space(),
    ))
}

/// [`storage_usage`] for the configured storage root.
pub fn device_storage_usage(config: &ScanConfig) -> Option<StorageUsage> {
    storage_root(config).and_then(|root| storage_usage(&root))
}

// deepest mount point that is a prefix of `target`
fn containing_mount(target: &Path, mounts: &[&Path]) -> Option<usize> {
    mounts
        .iter()
        .enumerate()
        .filter(|(_, mount)| target.starts_with(mount))
        .max_by_key(|(_, mount)| mount.components().count())
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deepest_mount_wins() {
        let mounts = [Path::new("/"), Path::new("/storage"), Path::new("/storage/emulated")];
        let target = Path::new("/storage/emulated/0/DCIM");
        assert_eq!(containing_mount(target, &mounts), Some(2));
        assert_eq!(containing_mount(Path::new("/data/app"), &mounts), Some(0));
        assert_eq!(containing_mount(Path::new("relative"), &mounts), None);
    }

    #[test]
    fn usage_is_derived_from_total_and_free() {
        let usage = StorageUsage::new(PathBuf::from("/"), 1_000, 250);
        assert_eq!(usage.used_bytes, 750);
        assert_eq!(usage.used_percent(), 75);
        assert_eq!(StorageUsage::new(PathBuf::from("/"), 0, 0).used_percent(), 0);
    }

    #[test]
    fn live_disk_usage_is_consistent() {
        let dir = tempfile::TempDir::new().unwrap();
        // containers may expose no disks at all
        if let Some(usage) = storage_usage(dir.path()) {
            assert!(usage.available_bytes <= usage.total_bytes);
            assert_eq!(usage.used_bytes + usage.available_bytes, usage.total_bytes);
            assert!(usage.used_percent() <= 100);
        }
    }
}
