// src/junk_cleaner/patterns.rs

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Junk signatures, matched case-insensitively anywhere in the candidate.
///
/// Segment patterns match a whole path component (`/logs/`, or `/logs` at the
/// end); suffix patterns match the end of the name. Either form matches the
/// slash-normalized full path as well as the bare file name.
pub(crate) const JUNK_PATTERNS: &[&str] = &[
    // Directory segments
    r"(/|\\)logs(/|\\|$)",
    r"(/|\\)temp(/|\\|$)",
    r"(/|\\)temporary(/|\\|$)",
    r"(/|\\)supersonicads(/|\\|$)",
    r"(/|\\)cache(/|\\|$)",
    r"(/|\\)Analytics(/|\\|$)",
    r"(/|\\)thumbnails?(/|\\|$)",
    r"(/|\\)mobvista(/|\\|$)",
    r"(/|\\)UnityAdsVideoCache(/|\\|$)",
    r"(/|\\)albumthumbs?(/|\\|$)",
    r"(/|\\)LOST.DIR(/|\\|$)",
    r"(/|\\)\.Trash(/|\\|$)",
    r"(/|\\)desktop.ini(/|\\|$)",
    r"(/|\\)leakcanary(/|\\|$)",
    r"(/|\\)\.DS_Store(/|\\|$)",
    r"(/|\\)\.spotlight-V100(/|\\|$)",
    r"(/|\\)fseventsd(/|\\|$)",
    r"(/|\\)Bugreport(/|\\|$)",
    r"(/|\\)bugreports(/|\\|$)",
    r"(/|\\)splashad(/|\\|$)",
    r"(/|\\)\.nomedia(/|\\|$)",
    // Extensions
    r"\.xapk$",
    r"\.property$",
    r"\.dat$",
    r"\.cached$",
    r"\.logcat$",
    r"\.download$",
    r"\.part$",
    r"\.crdownload$",
    r"\.thumbnails$",
    r"\.thumbdata$",
    r"\.thumb$",
    r"\.crash$",
    r"\.error$",
    r"\.stacktrace$",
    r"\.bak$",
    r"\.backup$",
    r"\.old$",
    r"\.prev$",
    r"\.apks$",
    r"\.apkm$",
    r"\.idea$",
    r"\.iml$",
    r"\.classpath$",
    r"\.project$",
    r"\.webcache$",
    r"\.indexeddb$",
    r"\.localstorage$",
    r"\.tmp$",
    r"\.log$",
    r"\.temp$",
    r"\.logs$",
    r"\.cache$",
    r"\.apk$",
    r"\.exo$",
    r"thumbs?\.db$",
    r"\.thumb[0-9]$",
    r"splashad$",
];

lazy_static! {
    static ref COMPILED_PATTERNS: Vec<Regex> = JUNK_PATTERNS
        .iter()
        .filter_map(|pattern| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(err) => {
                    log::warn!("Skipping junk pattern {}: {}", pattern, err);
                    None
                }
            }
        })
        .collect();
}

/// Number of patterns that compiled; equals `JUNK_PATTERNS.len()` in a sane build.
pub(crate) fn compiled_pattern_count() -> usize {
    COMPILED_PATTERNS.len()
}

/// `true` when any junk pattern matches the normalized path or the bare name.
pub fn is_junk(path: &str, name: &str) -> bool {
    let normalized = normalize_path(path);
    COMPILED_PATTERNS
        .iter()
        .any(|re| re.is_match(&normalized) || re.is_match(name))
}

pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles() {
        assert_eq!(compiled_pattern_count(), JUNK_PATTERNS.len());
        assert!(JUNK_PATTERNS.len() >= 50);
    }

    #[test]
    fn segment_must_be_whole_component() {
        assert!(is_junk("/sdcard/app/logs/today.txt", "today.txt"));
        assert!(is_junk("/sdcard/app/LOGS", "LOGS"));
        assert!(!is_junk("/sdcard/app/catalogs/today.txt", "today.txt"));
        assert!(!is_junk("/sdcard/app/logs.d/today.txt", "today.txt"));
    }

    #[test]
    fn backslash_paths_are_normalized() {
        assert!(is_junk(r"C:\data\Cache\blob.bin", "blob.bin"));
    }

    #[test]
    fn suffixes_match_case_insensitively() {
        assert!(is_junk("/x/setup.APK", "setup.APK"));
        assert!(is_junk("/x/Thumbs.db", "Thumbs.db"));
        assert!(is_junk("/x/image.thumb3", "image.thumb3"));
        assert!(is_junk("/x/vendor_splashad", "vendor_splashad"));
        assert!(!is_junk("/x/photo.jpg", "photo.jpg"));
        assert!(!is_junk("/x/readme.txt", "readme.txt"));
    }
}
