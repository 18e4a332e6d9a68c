use std::path::PathBuf;

use thiserror::Error;

use crate::device::DeviceId;

/// Errors that abort a whole reclaim run before anything is deleted.
#[derive(Debug, Error)]
pub enum ReclaimError {
    /// No target directory was supplied.
    #[error("no target directories given")]
    EmptyTargetSet,

    /// A target directory does not exist.
    #[error("directory not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// A target path exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The target directories live on more than one device.
    #[error("target directories span multiple devices: {}", format_devices(.0))]
    DeviceMismatch(Vec<(PathBuf, DeviceId)>),

    /// The free space of the device could not be determined.
    #[error("failed to query free space of {}: {source}", path.display())]
    FreeSpace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure while inspecting a target.
    #[error("failed to inspect {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_devices(devices: &[(PathBuf, DeviceId)]) -> String {
    devices
        .iter()
        .map(|(path, dev)| format!("{} (device {})", path.display(), dev))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ReclaimError>;

/// Errors raised while loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
