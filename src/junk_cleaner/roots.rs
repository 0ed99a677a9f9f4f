use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ScanConfig;

/// Primary shared storage on Android devices.
pub const ANDROID_EXTERNAL_STORAGE: &str = "/storage/emulated/0";

/// Directory name used under the platform data/cache dirs for this app.
pub const APP_DIR_NAME: &str = "junk-cleaner";

/// Junk-prone locations relative to the storage root.
pub const WELL_KNOWN_JUNK_DIRS: &[&str] = &[
    "Android/data",
    "Download",
    ".thumbnails",
    "Pictures/.thumbnails",
    "DCIM/.thumbnails",
    "Temp",
    "Temporary",
];

/// Storage root: configured value, else Android shared storage when present,
/// else the user's home directory.
pub fn storage_root(config: &ScanConfig) -> Option<PathBuf> {
    if let Some(root) = &config.storage_root {
        return Some(root.clone());
    }
    let android = Path::new(ANDROID_EXTERNAL_STORAGE);
    if android.is_dir() {
        return Some(android.to_path_buf());
    }
    dirs::home_dir()
}

/// Roots for a junk scan, in traversal order.
///
/// The storage root, app data dir and app cache dir are listed whether or not
/// they exist (the walker skips missing roots); well-known junk directories are
/// only listed when readable. Overlap between roots is expected and resolved by
/// the walker's visited set.
pub fn resolve_roots(config: &ScanConfig) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    let storage = storage_root(config);

    if let Some(root) = &storage {
        roots.push(root.clone());
    }

    let data_dir = config
        .app_data_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR_NAME)));
    roots.extend(data_dir);

    let cache_dir = config
        .app_cache_dir
        .clone()
        .or_else(|| dirs::cache_dir().map(|d| d.join(APP_DIR_NAME)));
    roots.extend(cache_dir);

    if let Some(root) = &storage {
        roots.extend(
            WELL_KNOWN_JUNK_DIRS
                .iter()
                .map(|rel| root.join(rel))
                .filter(|p| is_readable_dir(p)),
        );
    }

    roots.extend(config.extra_roots.iter().cloned());
    roots
}

/// Public media directories relative to the storage root.
pub const PUBLIC_MEDIA_DIRS: &[&str] = &[
    "Download",
    "Pictures",
    "Movies",
    "Music",
    "Documents",
    "DCIM",
];

/// Roots for a large-file scan: the storage root, its public media
/// directories, then the platform's own download/picture/video/audio/document
/// dirs. Only existing directories are kept, each once.
pub fn resolve_large_file_roots(config: &ScanConfig) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(root) = storage_root(config) {
        candidates.extend(PUBLIC_MEDIA_DIRS.iter().map(|rel| root.join(rel)));
        candidates.insert(0, root);
    }
    candidates.extend(
        [
            dirs::download_dir(),
            dirs::picture_dir(),
            dirs::video_dir(),
            dirs::audio_dir(),
            dirs::document_dir(),
        ]
        .into_iter()
        .flatten(),
    );

    let mut roots: Vec<PathBuf> = Vec::new();
    for path in candidates {
        if path.is_dir() && !roots.contains(&path) {
            roots.push(path);
        }
    }
    roots
}

fn is_readable_dir(path: &Path) -> bool {
    fs::read_dir(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn configured_dirs_lead_and_junk_dirs_are_filtered() {
        let storage = TempDir::new().unwrap();
        fs::create_dir_all(storage.path().join("Download")).unwrap();
        fs::create_dir_all(storage.path().join("DCIM/.thumbnails")).unwrap();

        let config = ScanConfig {
            storage_root: Some(storage.path().to_path_buf()),
            app_data_dir: Some(PathBuf::from("/nonexistent/app-data")),
            app_cache_dir: Some(PathBuf::from("/nonexistent/app-cache")),
            extra_roots: vec![PathBuf::from("/nonexistent/extra")],
            ..ScanConfig::default()
        };

        let roots = resolve_roots(&config);
        assert_eq!(
            roots,
            vec![
                storage.path().to_path_buf(),
                PathBuf::from("/nonexistent/app-data"),
                PathBuf::from("/nonexistent/app-cache"),
                storage.path().join("Download"),
                storage.path().join("DCIM/.thumbnails"),
                PathBuf::from("/nonexistent/extra"),
            ]
        );
    }

    #[test]
    fn large_file_roots_keep_existing_media_dirs_once() {
        let storage = TempDir::new().unwrap();
        fs::create_dir_all(storage.path().join("Download")).unwrap();
        fs::create_dir_all(storage.path().join("DCIM")).unwrap();

        let config = ScanConfig {
            storage_root: Some(storage.path().to_path_buf()),
            ..ScanConfig::default()
        };

        let roots = resolve_large_file_roots(&config);
        assert_eq!(
            &roots[..3],
            &[
                storage.path().to_path_buf(),
                storage.path().join("Download"),
                storage.path().join("DCIM"),
            ]
        );
        assert!(!roots.contains(&storage.path().join("Music")));
        for (i, root) in roots.iter().enumerate() {
            assert!(root.is_dir());
            assert!(!roots[i + 1..].contains(root));
        }
    }
}
