//! Device inspection: which device a directory lives on, and how much
//! space that device has available.
//!
//! Every call goes to the live filesystem; nothing is cached, since other
//! processes may be writing to the same device.

use std::fmt;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::statvfs::statvfs;
use serde::Serialize;

use crate::error::{ReclaimError, Result};

/// Identifier of the storage device backing a path (`st_dev`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceId(u64);

impl DeviceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view of the devices backing the target directories.
pub trait DeviceInspector {
    /// Resolve the device a directory resides on.
    ///
    /// Fails with `PathNotFound` if nothing exists at `path` and with
    /// `NotADirectory` if something other than a directory does.
    fn device_of(&self, path: &Path) -> Result<DeviceId>;

    /// Bytes available on the device backing `path`.
    fn free_space(&self, path: &Path) -> Result<u64>;
}

impl<T: DeviceInspector + ?Sized> DeviceInspector for &T {
    fn device_of(&self, path: &Path) -> Result<DeviceId> {
        (**self).device_of(path)
    }

    fn free_space(&self, path: &Path) -> Result<u64> {
        (**self).free_space(path)
    }
}

/// Inspector backed by `stat(2)` and `statvfs(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsInspector;

impl FsInspector {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceInspector for FsInspector {
    fn device_of(&self, path: &Path) -> Result<DeviceId> {
        // Follows symlinks: a linked target counts as the device it points to.
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ReclaimError::PathNotFound(path.to_path_buf()),
            _ => ReclaimError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        if !metadata.is_dir() {
            return Err(ReclaimError::NotADirectory(path.to_path_buf()));
        }

        Ok(DeviceId::new(metadata.dev()))
    }

    fn free_space(&self, path: &Path) -> Result<u64> {
        let stat = statvfs(path).map_err(|errno| match errno {
            Errno::ENOENT => ReclaimError::PathNotFound(path.to_path_buf()),
            other => ReclaimError::FreeSpace {
                path: path.to_path_buf(),
                source: io::Error::from(other),
            },
        })?;

        // Same figure `df` reports as "Avail": blocks usable by non-root.
        let available = (stat.blocks_available() as u64).saturating_mul(stat.fragment_size() as u64);
        tracing::trace!(path = %path.display(), available, "Queried free space");
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_of_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dev = FsInspector::new().device_of(dir.path()).unwrap();
        let expected = fs::metadata(dir.path()).unwrap().dev();
        assert_eq!(dev.raw(), expected);
    }

    #[test]
    fn test_device_of_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = FsInspector::new().device_of(&missing).unwrap_err();
        assert!(matches!(err, ReclaimError::PathNotFound(p) if p == missing));
    }

    #[test]
    fn test_device_of_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("recording.ts");
        fs::write(&file, b"data").unwrap();
        let err = FsInspector::new().device_of(&file).unwrap_err();
        assert!(matches!(err, ReclaimError::NotADirectory(p) if p == file));
    }

    #[test]
    fn test_device_of_symlinked_directory() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        let link = dir.path().join("link");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let inspector = FsInspector::new();
        assert_eq!(
            inspector.device_of(&real).unwrap(),
            inspector.device_of(&link).unwrap()
        );
    }

    #[test]
    fn test_free_space_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsInspector::new()
            .free_space(&dir.path().join("gone"))
            .unwrap_err();
        assert!(matches!(err, ReclaimError::PathNotFound(_)));
    }

    #[test]
    fn test_free_space_of_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsInspector::new().free_space(dir.path()).is_ok());
    }
}
