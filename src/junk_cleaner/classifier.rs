use serde::{Deserialize, Serialize};

/// Fixed junk categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    AppCache,
    ApkFiles,
    LogFiles,
    AdJunk,
    TempFiles,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::AppCache,
        Category::ApkFiles,
        Category::LogFiles,
        Category::AdJunk,
        Category::TempFiles,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Category::AppCache => "App Cache",
            Category::ApkFiles => "Apk Files",
            Category::LogFiles => "Log Files",
            Category::AdJunk => "AD Junk",
            Category::TempFiles => "Temp Files",
        }
    }

    /// Icon key for the rendering layer.
    pub fn icon(self) -> &'static str {
        match self {
            Category::AppCache => "ic_cache",
            Category::ApkFiles => "ic_apk_file",
            Category::LogFiles => "ic_log",
            Category::AdJunk => "ic_ad_junk",
            Category::TempFiles => "ic_temp",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Category::AppCache => 0,
            Category::ApkFiles => 1,
            Category::LogFiles => 2,
            Category::AdJunk => 3,
            Category::TempFiles => 4,
        }
    }
}

const CACHE_PATH_TOKENS: &[&str] = &["cache", "webview"];
const CACHE_SUFFIXES: &[&str] = &[
    ".cache",
    ".cached",
    ".webcache",
    ".indexeddb",
    ".localstorage",
    ".db-wal",
    ".db-shm",
];
const APK_SUFFIXES: &[&str] = &[".apk", ".apks", ".apkm", ".xapk"];
const LOG_SUFFIXES: &[&str] = &[
    ".log",
    ".logs",
    ".logcat",
    ".crash",
    ".error",
    ".stacktrace",
    ".trace",
];
// "ad" already covers every token after it; the rest document the SDKs we
// expect to catch.
const AD_PATH_TOKENS: &[&str] = &[
    "ad",
    "ads",
    "supersonicads",
    "mobvista",
    "unityadsvideocache",
    "splashad",
    "analytics",
    "bugreport",
    "bugreports",
];
const AD_SUFFIXES: &[&str] = &["splashad"];

/// Assign a category to a file that already passed [`super::patterns::is_junk`].
///
/// First match wins: cache, apk, log, ad, then temp as the catch-all.
pub fn classify(path: &str, name: &str) -> Category {
    let path_lower = path.to_lowercase();
    let name_lower = name.to_lowercase();

    let path_has = |tokens: &[&str]| tokens.iter().any(|t| path_lower.contains(t));
    let name_ends = |suffixes: &[&str]| suffixes.iter().any(|s| name_lower.ends_with(s));

    if path_has(CACHE_PATH_TOKENS) || name_ends(CACHE_SUFFIXES) {
        Category::AppCache
    } else if name_ends(APK_SUFFIXES) {
        Category::ApkFiles
    } else if name_ends(LOG_SUFFIXES) {
        Category::LogFiles
    } else if path_has(AD_PATH_TOKENS) || name_ends(AD_SUFFIXES) {
        Category::AdJunk
    } else {
        Category::TempFiles
    }
}
