//! The outcome of one reclaim run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::device::DeviceId;
use crate::error::ReclaimError;
use crate::target::{SpaceThreshold, TargetSet, BYTES_PER_MB};

/// What happened when deleting one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DeletionOutcome {
    /// The file was removed by this run.
    Deleted,
    /// The file was already gone when its turn came.
    Vanished,
    /// The file could not be removed.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionRecord {
    pub path: PathBuf,
    pub size: u64,
    /// Bytes released on the device. Zero for failures and for hard links
    /// whose inode is still referenced elsewhere.
    pub freed: u64,
    pub outcome: DeletionOutcome,
}

impl DeletionRecord {
    /// Bytes this deletion counts towards the target.
    pub fn reclaimed(&self) -> u64 {
        self.freed
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, DeletionOutcome::Failed { .. })
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    TargetAlreadyMet,
    TargetReached,
    ExhaustedWithoutReachingTarget,
    Aborted,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::TargetAlreadyMet | RunStatus::TargetReached)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::TargetAlreadyMet => "target-already-met",
            RunStatus::TargetReached => "target-reached",
            RunStatus::ExhaustedWithoutReachingTarget => "exhausted-without-reaching-target",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub targets: Vec<PathBuf>,
    pub min_free: SpaceThreshold,
    /// Device shared by all targets; unknown if the run aborted early.
    pub device: Option<DeviceId>,
    pub free_before: Option<u64>,
    pub free_after: Option<u64>,
    pub reclaimed_bytes: u64,
    /// Every attempted deletion, in the order it was attempted.
    pub deletions: Vec<DeletionRecord>,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub(crate) fn new(targets: &TargetSet, min_free: SpaceThreshold) -> Self {
        Self {
            targets: targets.iter().map(Path::to_path_buf).collect(),
            min_free,
            device: None,
            free_before: None,
            free_after: None,
            reclaimed_bytes: 0,
            deletions: Vec::new(),
            status: RunStatus::Aborted,
            error: None,
        }
    }

    pub(crate) fn aborted(targets: &TargetSet, min_free: SpaceThreshold, error: &ReclaimError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(targets, min_free)
        }
    }

    pub(crate) fn push(&mut self, record: DeletionRecord) {
        self.reclaimed_bytes = self.reclaimed_bytes.saturating_add(record.reclaimed());
        self.deletions.push(record);
    }

    /// Free space by the reclaimer's own accounting: measured start plus
    /// everything reclaimed since.
    pub fn estimated_free(&self) -> Option<u64> {
        self.free_before
            .map(|free| free.saturating_add(self.reclaimed_bytes))
    }

    pub fn deleted_count(&self) -> usize {
        self.deletions
            .iter()
            .filter(|r| r.outcome == DeletionOutcome::Deleted)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.deletions.iter().filter(|r| r.is_failure()).count()
    }

    fn available_mb(&self) -> u64 {
        self.free_after.or(self.estimated_free()).unwrap_or(0) / BYTES_PER_MB
    }
}

fn targets_display(targets: &[PathBuf]) -> String {
    targets
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable rendering: one line per deletion plus a summary.
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "You requested to have {} MB available in {}.",
            self.min_free.bytes() / BYTES_PER_MB,
            targets_display(&self.targets)
        )?;

        if self.status == RunStatus::Aborted {
            writeln!(f, "Aborted: {}", self.error.as_deref().unwrap_or("unknown error"))?;
            return writeln!(f, "Nothing was deleted.");
        }

        if self.status == RunStatus::TargetAlreadyMet {
            writeln!(f, "There is enough space available: {} MB", self.available_mb())?;
            return writeln!(f, "No cleanup necessary.");
        }

        let mut running = self.free_before.unwrap_or(0);
        for record in &self.deletions {
            running = running.saturating_add(record.reclaimed());
            match &record.outcome {
                DeletionOutcome::Deleted => {
                    writeln!(f, "Removing {}", record.path.display())?;
                    writeln!(f, "Space now available: {} MB.", running / BYTES_PER_MB)?;
                }
                DeletionOutcome::Vanished => {
                    writeln!(f, "Already removed: {}", record.path.display())?;
                    writeln!(f, "Space now available: {} MB.", running / BYTES_PER_MB)?;
                }
                DeletionOutcome::Failed { reason } => {
                    writeln!(f, "Failed to remove {}: {}", record.path.display(), reason)?;
                }
            }
        }

        match self.status {
            RunStatus::TargetReached => writeln!(
                f,
                "Reclaimed {} MB by deleting {} file(s) ({} failed). Space now available: {} MB.",
                self.reclaimed_bytes / BYTES_PER_MB,
                self.deleted_count(),
                self.failed_count(),
                self.available_mb()
            ),
            _ => {
                writeln!(f, "There is NOT enough space available: {} MB", self.available_mb())?;
                writeln!(f, "And there are no more files to delete.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = BYTES_PER_MB;

    fn record(name: &str, size: u64, outcome: DeletionOutcome) -> DeletionRecord {
        let freed = match outcome {
            DeletionOutcome::Failed { .. } => 0,
            _ => size,
        };
        DeletionRecord {
            path: PathBuf::from(name),
            size,
            freed,
            outcome,
        }
    }

    fn report(status: RunStatus) -> RunReport {
        let targets = TargetSet::single("/media/hdd/movie");
        let mut report = RunReport::new(&targets, SpaceThreshold::from_megabytes(1000));
        report.free_before = Some(400 * MB);
        report.status = status;
        report
    }

    #[test]
    fn test_reclaimed_excludes_failures() {
        let mut report = report(RunStatus::TargetReached);
        report.push(record("/a", 300 * MB, DeletionOutcome::Deleted));
        report.push(record(
            "/b",
            300 * MB,
            DeletionOutcome::Failed {
                reason: "Permission denied".into(),
            },
        ));
        report.push(record("/c", 100 * MB, DeletionOutcome::Vanished));

        assert_eq!(report.reclaimed_bytes, 400 * MB);
        assert_eq!(report.estimated_free(), Some(800 * MB));
        assert_eq!(report.deleted_count(), 1);
        assert_eq!(report.failed_count(), 1);
    }

    #[test]
    fn test_status_success_mapping() {
        assert!(RunStatus::TargetAlreadyMet.is_success());
        assert!(RunStatus::TargetReached.is_success());
        assert!(!RunStatus::ExhaustedWithoutReachingTarget.is_success());
        assert!(!RunStatus::Aborted.is_success());
    }

    #[test]
    fn test_render_already_met() {
        let mut report = report(RunStatus::TargetAlreadyMet);
        report.free_before = Some(2000 * MB);
        report.free_after = Some(2000 * MB);
        let text = report.to_string();
        assert!(text.contains("You requested to have 1000 MB available in /media/hdd/movie."));
        assert!(text.contains("There is enough space available: 2000 MB"));
        assert!(text.contains("No cleanup necessary."));
    }

    #[test]
    fn test_render_deletions_and_summary() {
        let mut report = report(RunStatus::TargetReached);
        report.push(record("/m/a.ts", 300 * MB, DeletionOutcome::Deleted));
        report.push(record("/m/b.ts", 300 * MB, DeletionOutcome::Deleted));
        report.free_after = Some(1000 * MB);

        let lines: Vec<String> = report.to_string().lines().map(String::from).collect();
        assert_eq!(lines[1], "Removing /m/a.ts");
        assert_eq!(lines[2], "Space now available: 700 MB.");
        assert_eq!(lines[3], "Removing /m/b.ts");
        assert_eq!(lines[4], "Space now available: 1000 MB.");
        assert!(lines[5].starts_with("Reclaimed 600 MB by deleting 2 file(s)"));
    }

    #[test]
    fn test_render_exhausted() {
        let mut report = report(RunStatus::ExhaustedWithoutReachingTarget);
        report.push(record("/m/a.ts", 100 * MB, DeletionOutcome::Deleted));
        let text = report.to_string();
        assert!(text.contains("There is NOT enough space available: 500 MB"));
        assert!(text.contains("And there are no more files to delete."));
    }

    #[test]
    fn test_render_aborted() {
        let targets = TargetSet::single("/missing");
        let err = ReclaimError::PathNotFound(PathBuf::from("/missing"));
        let report = RunReport::aborted(&targets, SpaceThreshold::from_megabytes(10), &err);
        let text = report.to_string();
        assert!(text.contains("Aborted: directory not found: /missing"));
        assert!(text.contains("Nothing was deleted."));
    }

    #[test]
    fn test_serialize_json() {
        let mut report = report(RunStatus::TargetReached);
        report.push(record(
            "/m/a.ts",
            MB,
            DeletionOutcome::Failed {
                reason: "Permission denied".into(),
            },
        ));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "target-reached");
        assert_eq!(value["min_free"], 1000 * MB);
        assert_eq!(value["deletions"][0]["outcome"]["kind"], "failed");
        assert_eq!(value["deletions"][0]["outcome"]["reason"], "Permission denied");
        assert!(value.get("error").is_none());
    }
}
