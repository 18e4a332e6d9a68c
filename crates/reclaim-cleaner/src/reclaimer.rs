//! Oldest-first deletion until the device has enough free space.
//!
//! A run checks that every target shares one device, measures free space
//! once, and returns early if the threshold already holds. Otherwise it
//! deletes the oldest regular files one by one and stops as soon as the
//! measured free space plus the bytes reclaimed so far meets the threshold.
//! Per-file failures are recorded and skipped; only configuration problems
//! (missing directories, mixed devices) abort the run, and they do so
//! before anything is deleted.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::candidate::{self, FileCandidate, FileId};
use crate::device::{DeviceId, DeviceInspector, FsInspector};
use crate::error::{ReclaimError, Result};
use crate::report::{DeletionOutcome, DeletionRecord, RunReport, RunStatus};
use crate::target::{SpaceThreshold, TargetSet};

pub struct SpaceReclaimer<I = FsInspector> {
    inspector: I,
}

impl Default for SpaceReclaimer<FsInspector> {
    fn default() -> Self {
        Self::new(FsInspector::new())
    }
}

impl<I: DeviceInspector> SpaceReclaimer<I> {
    pub fn new(inspector: I) -> Self {
        Self { inspector }
    }

    /// Run once, folding fatal errors into an `Aborted` report.
    pub fn reclaim(&self, targets: &TargetSet, min_free: SpaceThreshold) -> RunReport {
        match self.try_reclaim(targets, min_free) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(targets = %targets, error = %e, "Reclaim run aborted");
                RunReport::aborted(targets, min_free, &e)
            }
        }
    }

    /// Run once. `Err` means nothing was deleted.
    pub fn try_reclaim(&self, targets: &TargetSet, min_free: SpaceThreshold) -> Result<RunReport> {
        let device = self.common_device(targets)?;

        let mut report = RunReport::new(targets, min_free);
        report.device = Some(device);

        let free_before = self.inspector.free_space(targets.primary())?;
        report.free_before = Some(free_before);

        tracing::info!(
            device = %device,
            free = free_before,
            min_free = min_free.bytes(),
            "Measured free space"
        );

        if min_free.is_met(free_before) {
            tracing::info!(free = free_before, "Enough space available, no cleanup necessary");
            report.status = RunStatus::TargetAlreadyMet;
            report.free_after = Some(free_before);
            return Ok(report);
        }

        let mut candidates = candidate::enumerate(targets.iter());
        candidate::sort_oldest_first(&mut candidates);
        tracing::debug!(count = candidates.len(), "Collected deletion candidates");

        delete_oldest(candidates, free_before, min_free, &mut report);

        report.free_after = match self.inspector.free_space(targets.primary()) {
            Ok(free) => Some(free),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to measure free space after cleanup");
                None
            }
        };

        match report.status {
            RunStatus::ExhaustedWithoutReachingTarget => tracing::warn!(
                reclaimed = report.reclaimed_bytes,
                free = ?report.free_after,
                "Not enough space available and no more files to delete"
            ),
            _ => tracing::info!(
                reclaimed = report.reclaimed_bytes,
                deleted = report.deleted_count(),
                failed = report.failed_count(),
                free = ?report.free_after,
                "Cleanup completed"
            ),
        }

        Ok(report)
    }

    /// Device shared by every target, compared by id rather than path.
    fn common_device(&self, targets: &TargetSet) -> Result<DeviceId> {
        let mut devices = Vec::with_capacity(targets.len());
        for dir in targets.iter() {
            devices.push((dir.to_path_buf(), self.inspector.device_of(dir)?));
        }

        let first = devices[0].1;
        if devices.iter().any(|(_, dev)| *dev != first) {
            return Err(ReclaimError::DeviceMismatch(devices));
        }
        Ok(first)
    }
}

/// Delete `candidates` in order until `min_free` is met or the list runs out.
///
/// A file's size only counts once its last hard link is gone; links that
/// live outside the candidate set keep the inode, and its space, alive.
fn delete_oldest(
    candidates: Vec<FileCandidate>,
    free_before: u64,
    min_free: SpaceThreshold,
    report: &mut RunReport,
) {
    report.status = RunStatus::ExhaustedWithoutReachingTarget;
    let mut links_left: HashMap<FileId, u64> = HashMap::new();

    for candidate in candidates {
        let FileCandidate {
            path,
            size,
            file_id,
            links,
            ..
        } = candidate;

        let outcome = remove_candidate(&path, size);
        let freed = match outcome {
            DeletionOutcome::Failed { .. } => 0,
            DeletionOutcome::Deleted | DeletionOutcome::Vanished => {
                let left = links_left.entry(file_id).or_insert(links);
                *left = left.saturating_sub(1);
                if *left == 0 {
                    size
                } else {
                    tracing::debug!(path = %path.display(), remaining = *left, "Inode still linked");
                    0
                }
            }
        };

        report.push(DeletionRecord {
            path,
            size,
            freed,
            outcome,
        });

        if min_free.is_met(free_before.saturating_add(report.reclaimed_bytes)) {
            report.status = RunStatus::TargetReached;
            break;
        }
    }
}

fn remove_candidate(path: &Path, size: u64) -> DeletionOutcome {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), bytes = size, "Removed file");
            DeletionOutcome::Deleted
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "File already removed");
            DeletionOutcome::Vanished
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to remove file");
            DeletionOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
