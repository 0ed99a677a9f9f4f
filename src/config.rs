// src/config.rs

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::CleanerError;

/// Environment variable naming a JSON file that overrides [`ScanConfig`] fields.
pub const CONFIG_OVERRIDE_ENV: &str = "JUNK_CLEANER_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    // Walker limits
    pub max_depth: usize,           // Default: 6 (root is depth 0)
    pub max_entries_per_dir: usize, // Default: 200
    pub min_junk_size: u64,         // Default: 512 bytes

    // Roots
    pub storage_root: Option<PathBuf>,
    pub app_data_dir: Option<PathBuf>,
    pub app_cache_dir: Option<PathBuf>,
    pub extra_roots: Vec<PathBuf>,

    // Observers
    pub progress_interval_ms: u64, // Default: 50
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            max_depth: 6,
            max_entries_per_dir: 200,
            min_junk_size: 512,
            storage_root: None,
            app_data_dir: None,
            app_cache_dir: None,
            extra_roots: Vec::new(),
            progress_interval_ms: 50,
        }
    }
}

impl ScanConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    fn validate(self) -> Result<Self, CleanerError> {
        if self.max_entries_per_dir == 0 {
            return Err(CleanerError::Config(
                "max_entries_per_dir must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}

// Global configuration
lazy_static! {
    pub static ref DEFAULT_CONFIG: ScanConfig = ScanConfig::default();
}

/// Load the configuration, honouring `JUNK_CLEANER_CONFIG` when set.
pub fn load_config_result() -> Result<ScanConfig, CleanerError> {
    let Some(path) = env::var_os(CONFIG_OVERRIDE_ENV) else {
        return Ok(DEFAULT_CONFIG.clone());
    };
    let path = PathBuf::from(path);
    let raw = fs::read_to_string(&path).map_err(|e| {
        CleanerError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    let config: ScanConfig = serde_json::from_str(&raw).map_err(|e| {
        CleanerError::Config(format!("failed to parse {}: {}", path.display(), e))
    })?;
    config.validate()
}

/// Load the configuration with default fallback.
pub fn load_config() -> ScanConfig {
    load_config_result().unwrap_or_else(|err| {
        log::warn!("Ignoring config override: {}", err);
        DEFAULT_CONFIG.clone()
    })
}

// Operation metrics tracking

#[derive(Debug, Clone)]
pub struct OperationMetrics {
    pub operation: String,
    pub start_time: Instant,
    pub checkpoints: Vec<(String, Duration)>,
}

impl OperationMetrics {
    pub fn new(operation: impl Into<String>) -> Self {
        OperationMetrics {
            operation: operation.into(),
            start_time: Instant::now(),
            checkpoints: Vec::new(),
        }
    }

    pub fn checkpoint(&mut self, name: &str) {
        self.checkpoints
            .push((name.to_string(), self.start_time.elapsed()));
    }

    pub fn complete(self) -> OperationReport {
        OperationReport {
            operation: self.operation,
            total_duration: self.start_time.elapsed(),
            checkpoints: self.checkpoints,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    pub operation: String,
    pub total_duration: Duration,
    pub checkpoints: Vec<(String, Duration)>,
}
