//! What to clean and how much space to free.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ReclaimError, Result};

/// Bytes per megabyte, as used by the `-s` command-line option.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Non-empty, ordered list of directories to reclaim space from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSet {
    dirs: Vec<PathBuf>,
}

impl TargetSet {
    pub fn new<I, P>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let dirs: Vec<PathBuf> = dirs.into_iter().map(Into::into).collect();
        if dirs.is_empty() {
            return Err(ReclaimError::EmptyTargetSet);
        }
        Ok(Self { dirs })
    }

    pub fn single(dir: impl Into<PathBuf>) -> Self {
        Self {
            dirs: vec![dir.into()],
        }
    }

    /// The first directory; all of them share one device once validated.
    pub fn primary(&self) -> &Path {
        &self.dirs[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, dir) in self.dirs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", dir.display())?;
        }
        Ok(())
    }
}

/// Minimum number of bytes that must be available once the run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SpaceThreshold(u64);

impl SpaceThreshold {
    pub fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn from_megabytes(mb: u64) -> Self {
        Self(mb.saturating_mul(BYTES_PER_MB))
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }

    /// Inclusive: exactly `threshold` bytes available satisfies it.
    pub fn is_met(&self, available: u64) -> bool {
        available >= self.0
    }
}
