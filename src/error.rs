use thiserror::Error;

/// Errors surfaced by scan and cleanup operations.
///
/// Per-file I/O problems never show up here; the walker and the executor
/// skip those in place.
#[derive(Debug, Error)]
pub enum CleanerError {
    #[error("a scan is already running")]
    ScanInProgress,

    #[error("a cleanup is already running")]
    CleanupInProgress,

    #[error("operation was cancelled")]
    Cancelled,

    #[error("scan failed: {0}")]
    ScanFailed(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = CleanerError> = std::result::Result<T, E>;
