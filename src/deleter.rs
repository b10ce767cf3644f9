//! Best-effort removal of a confirmed batch of files.
//!
//! Each path succeeds or fails on its own. The only batch-wide failure is the
//! removal mechanism itself becoming unavailable (a [`Remover`] reporting
//! [`RemoveError::Unavailable`], or the deadline passing), in which case every
//! path not yet attempted is reported with that one reason.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::patterns::PatternSet;
use crate::utils;

pub const NOT_FOUND: &str = "not found";
pub const NOT_REGULAR_FILE: &str = "not a regular file";
pub const PATTERN_MISMATCH: &str = "name no longer matches any active pattern";

/// What happened to one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    Failed(String),
}

impl DeletionOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeletionOutcome::Deleted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOutcome {
    pub path: PathBuf,
    pub outcome: DeletionOutcome,
    /// Size of the removed file; zero unless deleted.
    pub freed_bytes: u64,
}

/// The removal mechanism went away part-way through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub reason: String,
    /// Paths that were never (successfully) handed to the mechanism.
    pub unattempted: usize,
}

/// Per-path outcomes for one batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct DeletionReport {
    entries: Vec<PathOutcome>,
    batch_failure: Option<BatchFailure>,
}

impl DeletionReport {
    pub fn entries(&self) -> &[PathOutcome] {
        &self.entries
    }

    pub fn deleted_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_deleted()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.len() - self.deleted_count()
    }

    pub fn freed_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.freed_bytes).sum()
    }

    pub fn batch_failure(&self) -> Option<&BatchFailure> {
        self.batch_failure.as_ref()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// `(path, reason)` for every failed entry.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            DeletionOutcome::Failed(reason) => Some((e.path.as_path(), reason.as_str())),
            DeletionOutcome::Deleted => None,
        })
    }
}

/// A list of paths the user has explicitly agreed to delete.
///
/// Only obtainable through
/// [`ConfirmedDeletionList::confirm`](crate::curator::ConfirmedDeletionList::confirm).
#[derive(Debug, Clone)]
pub struct DeletionBatch {
    paths: Vec<PathBuf>,
}

impl DeletionBatch {
    pub(crate) fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Debug)]
pub enum RemoveError {
    /// The OS refused or failed this one removal.
    Io(io::Error),
    /// The mechanism cannot remove anything any more.
    Unavailable(String),
}

/// The primitive that actually removes a file.
pub trait Remover {
    fn remove_file(&self, path: &Path) -> Result<(), RemoveError>;
}

/// Direct `std::fs` removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl Remover for FsRemover {
    fn remove_file(&self, path: &Path) -> Result<(), RemoveError> {
        std::fs::remove_file(path).map_err(RemoveError::Io)
    }
}

pub struct Deleter<R = FsRemover> {
    patterns: PatternSet,
    protected: Vec<PathBuf>,
    timeout: Option<Duration>,
    remover: R,
}

impl Deleter<FsRemover> {
    /// Deleter re-validating against `patterns`, with the platform deny-list
    /// and the default deadline.
    pub fn new(patterns: PatternSet) -> Self {
        Self {
            patterns,
            protected: default_protected_dirs(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            remover: FsRemover,
        }
    }
}

impl<R: Remover> Deleter<R> {
    pub fn with_remover<R2: Remover>(self, remover: R2) -> Deleter<R2> {
        Deleter {
            patterns: self.patterns,
            protected: self.protected,
            timeout: self.timeout,
            remover,
        }
    }

    /// `None` removes the deadline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add directories whose contents must never be removed.
    pub fn with_protected_dirs<I>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for dir in dirs {
            let dir = utils::normalize_path(&dir);
            if !self.protected.contains(&dir) {
                self.protected.push(dir);
            }
        }
        self
    }

    pub fn protected_dirs(&self) -> &[PathBuf] {
        &self.protected
    }

    /// Attempt every path in `batch`, recording one outcome per path.
    pub fn delete_all(&self, batch: &DeletionBatch) -> DeletionReport {
        tracing::info!(files = batch.len(), "deleting confirmed files");
        let started = Instant::now();
        let mut entries = Vec::with_capacity(batch.len());
        let mut batch_failure = None;

        for (idx, path) in batch.paths().iter().enumerate() {
            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    let reason = format!("timed out after {} s", limit.as_secs());
                    batch_failure = Some(fail_remaining(
                        &mut entries,
                        &batch.paths()[idx..],
                        reason,
                    ));
                    break;
                }
            }

            let size = match self.precheck(path) {
                Ok(size) => size,
                Err(reason) => {
                    tracing::warn!(path = %path.display(), %reason, "not deleting");
                    entries.push(failed(path, reason));
                    continue;
                }
            };

            match self.remover.remove_file(path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "deleted");
                    entries.push(PathOutcome {
                        path: path.clone(),
                        outcome: DeletionOutcome::Deleted,
                        freed_bytes: size,
                    });
                }
                Err(RemoveError::Io(e)) => {
                    let reason = describe_io_error(&e);
                    tracing::warn!(path = %path.display(), %reason, "failed to delete");
                    entries.push(failed(path, reason));
                }
                Err(RemoveError::Unavailable(reason)) => {
                    batch_failure = Some(fail_remaining(
                        &mut entries,
                        &batch.paths()[idx..],
                        reason,
                    ));
                    break;
                }
            }
        }

        let report = DeletionReport {
            entries,
            batch_failure,
        };
        tracing::info!(
            deleted = report.deleted_count(),
            failed = report.failed_count(),
            freed = report.freed_bytes(),
            "deletion complete"
        );
        report
    }

    /// Re-validate `path` just before removal; `Ok` carries its size.
    fn precheck(&self, path: &Path) -> Result<u64, String> {
        let meta = match std::fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(NOT_FOUND.to_string()),
            Err(e) => return Err(describe_io_error(&e)),
        };
        if !meta.file_type().is_file() {
            return Err(NOT_REGULAR_FILE.to_string());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if !self.patterns.is_match(&name) {
            return Err(PATTERN_MISMATCH.to_string());
        }

        let resolved = utils::normalize_path(path);
        if let Some(dir) = self.protected.iter().find(|dir| is_within(&resolved, dir)) {
            return Err(format!("inside protected directory {}", dir.display()));
        }

        Ok(meta.len())
    }
}

fn failed(path: &Path, reason: String) -> PathOutcome {
    PathOutcome {
        path: path.to_path_buf(),
        outcome: DeletionOutcome::Failed(reason),
        freed_bytes: 0,
    }
}

fn fail_remaining(
    entries: &mut Vec<PathOutcome>,
    rest: &[PathBuf],
    reason: String,
) -> BatchFailure {
    let reason = format!("deletion mechanism unavailable: {reason}");
    tracing::warn!(unattempted = rest.len(), %reason, "aborting deletion batch");
    entries.extend(rest.iter().map(|p| failed(p, reason.clone())));
    BatchFailure {
        reason,
        unattempted: rest.len(),
    }
}

fn describe_io_error(e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::NotFound => NOT_FOUND.to_string(),
        io::ErrorKind::PermissionDenied => format!("permission denied: {e}"),
        _ => e.to_string(),
    }
}

#[cfg(windows)]
fn is_within(path: &Path, dir: &Path) -> bool {
    let lower = |p: &Path| PathBuf::from(p.to_string_lossy().to_lowercase());
    lower(path).starts_with(lower(dir))
}

#[cfg(not(windows))]
fn is_within(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

/// OS installation and program directories.
#[cfg(windows)]
pub fn default_protected_dirs() -> Vec<PathBuf> {
    let from_env = |var: &str, fallback: &str| {
        std::env::var_os(var)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(fallback))
    };
    vec![
        from_env("SystemRoot", r"C:\Windows"),
        from_env("ProgramFiles", r"C:\Program Files"),
        from_env("ProgramFiles(x86)", r"C:\Program Files (x86)"),
        from_env("ProgramData", r"C:\ProgramData"),
    ]
    .into_iter()
    .map(|p| utils::normalize_path(&p))
    .collect()
}

/// OS installation and program directories.
#[cfg(not(windows))]
pub fn default_protected_dirs() -> Vec<PathBuf> {
    [
        "/bin",
        "/sbin",
        "/usr",
        "/etc",
        "/boot",
        "/lib",
        "/lib64",
        "/System",
        "/Applications",
    ]
    .iter()
    .map(|p| utils::normalize_path(Path::new(p)))
    .collect()
}
