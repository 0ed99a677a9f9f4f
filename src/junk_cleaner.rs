mod classifier;
mod executor;
mod format;
pub mod large_files;
mod patterns;
pub mod photos;
pub mod roots;
mod session;
mod storage;
pub mod types;
pub mod walker;


pub use classifier::{classify, Category};
pub use executor::{delete_files, Deletable};
pub use format::{format_file_size, format_size};
pub use large_files::{
    cancel_large_file_scan, run_large_file_scan, scan_large_files, size_presets, FileKind,
    LargeFile, LargeFileFilter, TimeWindow,
};
pub use patterns::is_junk;
pub use photos::{day_label, group_photos_by_day, scan_photos, PhotoGroup};
pub use roots::{resolve_large_file_roots, resolve_roots};
pub use session::ScanSession;
pub use storage::{device_storage_usage, storage_usage, StorageUsage};
pub use types::{
    BucketSummary, CategoryBucket, CleanProgress, CleanReport, JunkFile, ScanState,
    SessionSnapshot,
};
pub use walker::{collect_junk, JunkWalk, WalkEvent, WalkLimits, WalkSummary};
