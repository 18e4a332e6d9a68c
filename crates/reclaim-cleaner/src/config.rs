//! Configuration for the reclaim cleaner.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reclaim_logging::LogConfig;

use crate::error::ConfigError;
use crate::target::{SpaceThreshold, TargetSet};

/// Directory holding recordings on the set-top boxes this tool targets.
pub const DEFAULT_DIRECTORY: &str = "/media/hdd/movie";

/// 50 GB.
pub const DEFAULT_MIN_FREE_MB: u64 = 50 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclaimConfig {
    /// Directories to delete old files from. All must be on one device.
    #[serde(default = "default_directories")]
    pub directories: Vec<PathBuf>,

    /// Space that must be available afterwards, in megabytes.
    #[serde(default = "default_min_free_mb")]
    pub min_free_mb: u64,

    /// Re-run interval. If zero, run once and exit.
    #[serde(default)]
    pub interval_secs: u64,

    #[serde(default)]
    pub log: LogConfig,
}

fn default_directories() -> Vec<PathBuf> {
    vec![PathBuf::from(DEFAULT_DIRECTORY)]
}

fn default_min_free_mb() -> u64 {
    DEFAULT_MIN_FREE_MB
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            directories: default_directories(),
            min_free_mb: default_min_free_mb(),
            interval_secs: 0,
            log: LogConfig::default(),
        }
    }
}

impl ReclaimConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directories.is_empty() {
            return Err(ConfigError::Invalid("directories must not be empty".into()));
        }
        if self.directories.iter().any(|d| d.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid("directory paths must not be empty".into()));
        }
        Ok(())
    }

    pub fn targets(&self) -> Result<TargetSet, ConfigError> {
        TargetSet::new(self.directories.iter().cloned())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn threshold(&self) -> SpaceThreshold {
        SpaceThreshold::from_megabytes(self.min_free_mb)
    }

    /// Return the run interval as a `Duration`, or `None` if the cleaner
    /// should run once and exit.
    pub fn interval(&self) -> Option<Duration> {
        if self.interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.interval_secs))
        }
    }
}
