pub mod config;
mod error;
mod junk_cleaner;
pub mod ops;

pub use config::{load_config, load_config_result, ScanConfig, DEFAULT_CONFIG};
pub use error::{CleanerError, Result};
pub use junk_cleaner::*;
pub use ops::{OperationKind, OperationRegistry, OperationStatus};
