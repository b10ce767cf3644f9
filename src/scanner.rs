//! Directory traversal that finds candidate temporary files.
//!
//! A scan is read-only. It either produces a complete [`ScanResult`] or fails
//! with a [`ScanError`]; partial results are never returned.

use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::ScanError;
use crate::patterns::PatternSet;
use crate::utils;

/// One discovered candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Normalized absolute path.
    pub path: PathBuf,
    /// Final path component.
    pub name: String,
    pub size_bytes: Option<u64>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Build a record for `path`, reading size and mtime from `metadata`
    /// when available. `path` is normalized here.
    pub fn new(path: &Path, metadata: Option<&Metadata>) -> Self {
        let path = utils::normalize_path(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            size_bytes: metadata.map(Metadata::len),
            modified_at: metadata
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
            path,
        }
    }
}

/// Outcome of one scan: records sorted by path, without duplicates.
#[derive(Debug, Clone)]
pub struct ScanResult {
    root: PathBuf,
    records: Vec<FileRecord>,
    warnings: Vec<String>,
}

impl ScanResult {
    /// Sort and deduplicate `records` by path.
    pub fn from_records(root: PathBuf, records: Vec<FileRecord>, warnings: Vec<String>) -> Self {
        let by_path: BTreeMap<PathBuf, FileRecord> = records
            .into_iter()
            .map(|r| (r.path.clone(), r))
            .collect();
        Self {
            root,
            records: by_path.into_values().collect(),
            warnings,
        }
    }

    /// The normalized directory that was scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Non-fatal problems hit during traversal (e.g. unreadable subfolders).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of known sizes.
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().filter_map(|r| r.size_bytes).sum()
    }

    /// Look up a record by an already-normalized path.
    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records
            .binary_search_by(|r| r.path.as_path().cmp(path))
            .ok()
            .map(|idx| &self.records[idx])
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.records.iter().map(|r| r.path.clone()).collect()
    }
}

/// Traversal knobs.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Follow symlinks. Aliased files are collapsed to one record, and links
    /// are kept only when their target is under the root and its name matches.
    pub follow_links: bool,
    /// Give up (with [`ScanError::Unavailable`]) once this much time has passed.
    ///
    /// Checked between directory entries only: a single `readdir` that blocks,
    /// e.g. on an unreachable network share, is not interrupted and can run
    /// past the deadline.
    pub timeout: Option<Duration>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_links: false,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

/// Enumerate regular files under `root` whose name matches `patterns`.
pub fn scan(
    root: &Path,
    patterns: &PatternSet,
    options: &ScanOptions,
) -> Result<ScanResult, ScanError> {
    if patterns.is_empty() {
        return Err(ScanError::NoPatterns);
    }

    let metadata = match std::fs::metadata(root) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(ScanError::Unavailable {
                path: root.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let root = utils::normalize_path(root);
    if let Err(e) = std::fs::read_dir(&root) {
        return Err(ScanError::Unavailable {
            path: root,
            reason: e.to_string(),
        });
    }

    tracing::info!(
        root = %root.display(),
        patterns = ?patterns.to_strings(),
        recursive = options.recursive,
        "scanning for temporary files"
    );

    let started = Instant::now();
    let mut walker = WalkDir::new(&root).follow_links(options.follow_links);
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for entry in walker {
        if let Some(limit) = options.timeout {
            if started.elapsed() >= limit {
                tracing::warn!(root = %root.display(), "scan timed out");
                return Err(ScanError::Unavailable {
                    path: root,
                    reason: format!("timed out after {} s", limit.as_secs()),
                });
            }
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                warnings.push(e.to_string());
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        let Some(pattern) = patterns.matching(&name) else {
            continue;
        };
        tracing::debug!(path = %entry.path().display(), pattern = pattern.as_str(), "matched");

        let metadata = entry.metadata().ok();
        let record = if options.follow_links {
            let record = FileRecord::new(entry.path(), metadata.as_ref());
            if !record.path.starts_with(&root) {
                tracing::warn!(
                    link = %entry.path().display(),
                    target = %record.path.display(),
                    "skipping link that resolves outside the scan root"
                );
                warnings.push(format!(
                    "skipped {}: resolves outside {}",
                    entry.path().display(),
                    root.display()
                ));
                continue;
            }
            // The resolved name is what gets deleted, so it must qualify too.
            if !patterns.is_match(&record.name) {
                tracing::debug!(
                    link = %entry.path().display(),
                    target = %record.path.display(),
                    "link target does not match any pattern"
                );
                continue;
            }
            record
        } else {
            // Already under the canonical root and not reached through a link.
            FileRecord {
                path: entry.path().to_path_buf(),
                name: name.into_owned(),
                size_bytes: metadata.as_ref().map(Metadata::len),
                modified_at: metadata
                    .as_ref()
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from),
            }
        };
        records.push(record);
    }

    let result = ScanResult::from_records(root, records, warnings);
    tracing::info!(
        found = result.len(),
        bytes = result.total_bytes(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scan complete"
    );
    Ok(result)
}
