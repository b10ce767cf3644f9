//! Reconciles a user's selection with the scan result and the live filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::deleter::DeletionBatch;
use crate::error::ConfirmationError;
use crate::scanner::{FileRecord, ScanResult};
use crate::utils;

/// Why a chosen path did not make it into the confirmed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The path was never part of the scan that produced the choices.
    NotInScan,
    /// The file disappeared between scanning and curation.
    Vanished,
    /// Something still lives at the path but it is no longer a regular file.
    NotRegularFile,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DropReason::NotInScan => "not part of the scan result",
            DropReason::Vanished => "no longer exists",
            DropReason::NotRegularFile => "no longer a regular file",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPath {
    pub path: PathBuf,
    pub reason: DropReason,
}

/// Paths that passed curation, in the order they were chosen.
///
/// Never empty; turning it into a [`DeletionBatch`] requires the caller's
/// yes/no confirmation through [`ConfirmedDeletionList::confirm`].
#[derive(Debug, Clone)]
pub struct ConfirmedDeletionList {
    records: Vec<FileRecord>,
}

impl ConfirmedDeletionList {
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.records.iter().map(|r| r.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.iter().filter_map(|r| r.size_bytes).sum()
    }

    /// Record that the user affirmatively agreed to delete `count` files.
    ///
    /// `count` must be exactly the number of files in the list, i.e. the
    /// figure the user was shown when asked.
    pub fn confirm(&self, count: usize) -> Result<DeletionBatch, ConfirmationError> {
        if count != self.records.len() {
            return Err(ConfirmationError {
                confirmed: count,
                expected: self.records.len(),
            });
        }
        Ok(DeletionBatch::new(self.paths()))
    }
}

/// Result of curation.
#[derive(Debug, Clone)]
pub enum Curation {
    Confirmed {
        list: ConfirmedDeletionList,
        dropped: Vec<DroppedPath>,
    },
    /// The user picked nothing, or everything they picked is gone.
    NothingToDelete { dropped: Vec<DroppedPath> },
}

impl Curation {
    pub fn dropped(&self) -> &[DroppedPath] {
        match self {
            Curation::Confirmed { dropped, .. } | Curation::NothingToDelete { dropped } => dropped,
        }
    }

    pub fn list(&self) -> Option<&ConfirmedDeletionList> {
        match self {
            Curation::Confirmed { list, .. } => Some(list),
            Curation::NothingToDelete { .. } => None,
        }
    }

    pub fn into_list(self) -> Option<ConfirmedDeletionList> {
        match self {
            Curation::Confirmed { list, .. } => Some(list),
            Curation::NothingToDelete { .. } => None,
        }
    }
}

/// Keep the chosen paths that belong to `scan` and are still regular files.
pub fn curate(scan: &ScanResult, chosen: &[PathBuf]) -> Curation {
    let mut records: Vec<FileRecord> = Vec::new();
    let mut dropped: Vec<DroppedPath> = Vec::new();

    for raw in chosen {
        let path = utils::normalize_path(raw);
        let seen =
            records.iter().any(|r| r.path == path) || dropped.iter().any(|d| d.path == path);
        if seen {
            continue;
        }

        let Some(record) = scan.get(&path) else {
            dropped.push(drop_path(path, DropReason::NotInScan));
            continue;
        };

        match live_check(&path) {
            Some(reason) => dropped.push(drop_path(path, reason)),
            None => records.push(record.clone()),
        }
    }

    tracing::info!(
        chosen = chosen.len(),
        confirmed = records.len(),
        dropped = dropped.len(),
        "curated selection"
    );

    if records.is_empty() {
        Curation::NothingToDelete { dropped }
    } else {
        Curation::Confirmed {
            list: ConfirmedDeletionList { records },
            dropped,
        }
    }
}

fn live_check(path: &Path) -> Option<DropReason> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_file() => None,
        Ok(_) => Some(DropReason::NotRegularFile),
        Err(_) => Some(DropReason::Vanished),
    }
}

fn drop_path(path: PathBuf, reason: DropReason) -> DroppedPath {
    tracing::warn!(path = %path.display(), %reason, "dropping selected path");
    DroppedPath { path, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternSet;
    use crate::scanner::{scan, ScanOptions};
    use std::fs;

    fn scan_dir(dir: &Path) -> ScanResult {
        let patterns = PatternSet::from_candidates(["~$$*.vsd"]).0;
        scan(dir, &patterns, &ScanOptions::default()).unwrap()
    }

    fn two_file_scan() -> (tempfile::TempDir, ScanResult) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("~$$a.vsd"), b"aa").unwrap();
        fs::write(dir.path().join("~$$b.vsd"), b"bbb").unwrap();
        let result = scan_dir(dir.path());
        (dir, result)
    }

    #[test]
    fn test_all_present_paths_are_confirmed_in_choice_order() {
        let (_dir, result) = two_file_scan();
        let mut chosen = result.paths();
        chosen.reverse();

        let curation = curate(&result, &chosen);
        let list = curation.list().unwrap();
        assert_eq!(list.paths(), chosen);
        assert_eq!(list.total_bytes(), 5);
        assert!(curation.dropped().is_empty());
    }

    #[test]
    fn test_empty_choice_is_nothing_to_delete() {
        let (_dir, result) = two_file_scan();
        let curation = curate(&result, &[]);
        assert!(matches!(curation, Curation::NothingToDelete { .. }));
    }

    #[test]
    fn test_vanished_file_is_dropped_and_reported() {
        let (_dir, result) = two_file_scan();
        let paths = result.paths();
        fs::remove_file(&paths[0]).unwrap();

        let curation = curate(&result, &paths);
        assert_eq!(curation.list().unwrap().paths(), vec![paths[1].clone()]);
        assert_eq!(
            curation.dropped(),
            &[DroppedPath {
                path: paths[0].clone(),
                reason: DropReason::Vanished
            }]
        );
    }

    #[test]
    fn test_everything_vanished_is_nothing_to_delete() {
        let (_dir, result) = two_file_scan();
        for p in result.paths() {
            fs::remove_file(p).unwrap();
        }
        let curation = curate(&result, &result.paths());
        assert!(curation.list().is_none());
        assert_eq!(curation.dropped().len(), 2);
    }

    #[test]
    fn test_path_outside_scan_is_never_returned() {
        let (dir, result) = two_file_scan();
        let outsider = dir.path().join("~$$late.vsd");
        fs::write(&outsider, b"").unwrap();

        let mut chosen = result.paths();
        chosen.push(outsider);
        let curation = curate(&result, &chosen);

        let list = curation.list().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.paths().iter().all(|p| result.contains(p)));
        assert_eq!(curation.dropped()[0].reason, DropReason::NotInScan);
    }

    #[test]
    fn test_replaced_by_directory_is_not_regular_file() {
        let (_dir, result) = two_file_scan();
        let paths = result.paths();
        fs::remove_file(&paths[0]).unwrap();
        fs::create_dir(&paths[0]).unwrap();

        let curation = curate(&result, &paths[..1]);
        assert!(curation.list().is_none());
        assert_eq!(curation.dropped()[0].reason, DropReason::NotRegularFile);
    }

    #[test]
    fn test_duplicate_and_unnormalized_choices_collapse() {
        let (_dir, result) = two_file_scan();
        let first = result.paths()[0].clone();
        let dotted = first.parent().unwrap().join(".").join(first.file_name().unwrap());

        let curation = curate(&result, &[first.clone(), dotted]);
        assert_eq!(curation.list().unwrap().paths(), vec![first]);
    }

    #[test]
    fn test_confirm_requires_exact_count() {
        let (_dir, result) = two_file_scan();
        let list = curate(&result, &result.paths()).into_list().unwrap();

        assert_eq!(
            list.confirm(1).unwrap_err(),
            ConfirmationError {
                confirmed: 1,
                expected: 2
            }
        );
        let batch = list.confirm(2).unwrap();
        assert_eq!(batch.len(), 2);
    }
}
