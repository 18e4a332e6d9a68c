//! Frees disk space by deleting the oldest files under a set of directories.
//!
//! Given one or more target directories on a single device and a minimum
//! amount of free space, the reclaimer deletes regular files oldest-first
//! (by modification time, ties broken by path) until the device has at
//! least that much space available, or nothing is left to delete.
//! Directories are never removed.
//!
//! ```no_run
//! use reclaim_cleaner::{SpaceReclaimer, SpaceThreshold, TargetSet};
//!
//! let targets = TargetSet::single("/media/hdd/movie");
//! let report = SpaceReclaimer::default().reclaim(&targets, SpaceThreshold::from_megabytes(51200));
//! print!("{report}");
//! ```

pub mod candidate;
pub mod config;
pub mod device;
pub mod error;
pub mod reclaimer;
pub mod report;
pub mod target;

pub use candidate::FileCandidate;
pub use config::ReclaimConfig;
pub use device::{DeviceId, DeviceInspector, FsInspector};
pub use error::{ConfigError, ReclaimError};
pub use reclaimer::SpaceReclaimer;
pub use report::{DeletionOutcome, DeletionRecord, RunReport, RunStatus};
pub use target::{SpaceThreshold, TargetSet};
