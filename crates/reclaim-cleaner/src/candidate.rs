//! Discovery and ordering of deletable files.

use std::cmp::Ordering;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

/// Inode identity; hard links to one file share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    pub dev: u64,
    pub ino: u64,
}

/// A regular file found beneath one of the target directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Size in bytes at enumeration time.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    pub file_id: FileId,
    /// Hard link count at enumeration time.
    pub links: u64,
}

impl FileCandidate {
    /// Oldest first; equal timestamps fall back to the path.
    pub fn age_order(&self, other: &Self) -> Ordering {
        self.modified
            .cmp(&other.modified)
            .then_with(|| self.path.cmp(&other.path))
    }
}

/// Recursively collect every regular file under `roots`.
///
/// Symlinks below a root are neither followed nor returned, so nothing
/// outside the target trees is ever considered. Entries that cannot be read
/// (permissions, removed mid-walk) are skipped with a warning.
pub fn enumerate<'a, I>(roots: I) -> Vec<FileCandidate>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut candidates = Vec::new();

    for root in roots {
        let root = match fs::canonicalize(root) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!(path = %root.display(), error = %e, "Failed to resolve target directory");
                continue;
            }
        };

        tracing::debug!(path = %root.display(), "Scanning target directory");

        for entry in WalkDir::new(&root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        path = ?e.path(),
                        error = %e,
                        "Skipping unreadable entry"
                    );
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "Failed to stat entry"
                    );
                    continue;
                }
            };

            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "No modification time available"
                    );
                    continue;
                }
            };

            candidates.push(FileCandidate {
                path: entry.into_path(),
                size: metadata.len(),
                modified,
                file_id: FileId {
                    dev: metadata.dev(),
                    ino: metadata.ino(),
                },
                links: metadata.nlink(),
            });
        }
    }

    candidates
}

/// Sort oldest first and drop files reached through more than one root.
pub fn sort_oldest_first(candidates: &mut Vec<FileCandidate>) {
    candidates.sort_by(FileCandidate::age_order);
    // Duplicates share path and mtime, so they end up adjacent.
    candidates.dedup_by(|a, b| a.path == b.path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, UNIX_EPOCH};

    fn create_file(path: &Path, size: u64, mtime_secs: u64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let file = File::create(path).unwrap();
        file.set_len(size).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(mtime_secs))
            .unwrap();
    }

    fn names(candidates: &[FileCandidate]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| c.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_enumerate_recurses_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        create_file(&dir.path().join("a.ts"), 10, 1);
        create_file(&dir.path().join("sub/b.ts"), 20, 2);
        create_file(&dir.path().join("sub/deeper/c.ts"), 30, 3);
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let mut found = enumerate([dir.path()]);
        sort_oldest_first(&mut found);

        assert_eq!(names(&found), vec!["a.ts", "b.ts", "c.ts"]);
        assert_eq!(found[1].size, 20);
        assert!(found.iter().all(|c| c.path.is_absolute()));
    }

    #[test]
    fn test_enumerate_skips_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        create_file(&outside.path().join("keep.ts"), 10, 1);
        create_file(&dir.path().join("own.ts"), 10, 2);
        std::os::unix::fs::symlink(outside.path().join("keep.ts"), dir.path().join("file-link"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("dir-link")).unwrap();

        let found = enumerate([dir.path()]);
        assert_eq!(names(&found), vec!["own.ts"]);
    }

    #[test]
    fn test_enumerate_ignores_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        create_file(&dir.path().join("a.ts"), 10, 1);
        let missing = dir.path().join("missing");

        let found = enumerate([missing.as_path(), dir.path()]);
        assert_eq!(names(&found), vec!["a.ts"]);
    }

    #[test]
    fn test_sort_breaks_ties_by_path() {
        let dir = tempfile::tempdir().unwrap();
        create_file(&dir.path().join("c.ts"), 1, 100);
        create_file(&dir.path().join("a.ts"), 1, 100);
        create_file(&dir.path().join("b.ts"), 1, 50);

        let mut found = enumerate([dir.path()]);
        sort_oldest_first(&mut found);
        assert_eq!(names(&found), vec!["b.ts", "a.ts", "c.ts"]);
    }

    #[test]
    fn test_hard_links_share_file_id() {
        let dir = tempfile::tempdir().unwrap();
        create_file(&dir.path().join("a.ts"), 10, 1);
        fs::hard_link(dir.path().join("a.ts"), dir.path().join("b.ts")).unwrap();
        create_file(&dir.path().join("c.ts"), 10, 2);

        let mut found = enumerate([dir.path()]);
        sort_oldest_first(&mut found);

        assert_eq!(names(&found), vec!["a.ts", "b.ts", "c.ts"]);
        assert_eq!(found[0].file_id, found[1].file_id);
        assert_ne!(found[0].file_id, found[2].file_id);
        assert_eq!(found[0].links, 2);
        assert_eq!(found[2].links, 1);
    }

    #[test]
    fn test_overlapping_roots_yield_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        create_file(&dir.path().join("top.ts"), 1, 1);
        create_file(&dir.path().join("nested/inner.ts"), 1, 2);

        let nested = dir.path().join("nested");
        let mut found = enumerate([dir.path(), nested.as_path()]);
        assert_eq!(found.len(), 3);

        sort_oldest_first(&mut found);
        assert_eq!(names(&found), vec!["top.ts", "inner.ts"]);
    }
}
