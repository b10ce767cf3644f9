//! Error types shared by the scan → curate → delete pipeline.
//!
//! Per-file deletion failures are not errors here: they are recorded as
//! [`DeletionOutcome::Failed`](crate::deleter::DeletionOutcome) entries so one
//! locked file never aborts a batch.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures while loading or validating the configuration document.
///
/// All of these are fatal at startup (`ConfigInvalid`).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("configuration file not found at '{path}'")]
    NotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// The config file exists but could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON, or a field has the wrong type.
    #[error("could not decode JSON from '{path}': {source}")]
    Decode {
        /// The path of the malformed document.
        path: PathBuf,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Every configured pattern was rejected by the safety check.
    #[error("no valid file patterns found in configuration")]
    NoSafePatterns,
}

/// Scan-level failures. Callers recover from these at the pipeline boundary,
/// typically by re-prompting for a directory or retrying.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The scan root does not exist.
    #[error("directory not found: '{path}'")]
    DirectoryNotFound {
        /// The requested root.
        path: PathBuf,
    },

    /// The scan root exists but is not a directory.
    #[error("not a directory: '{path}'")]
    NotADirectory {
        /// The requested root.
        path: PathBuf,
    },

    /// No patterns were supplied, so nothing could ever match.
    #[error("no file patterns supplied; check the configuration")]
    NoPatterns,

    /// The enumeration itself failed or ran past its deadline.
    #[error("scan unavailable for '{path}': {reason}")]
    Unavailable {
        /// The requested root.
        path: PathBuf,
        /// Human-readable cause.
        reason: String,
    },
}

impl ScanError {
    /// True for the "directory does not exist / is not a directory" family,
    /// which a prompt-driven caller answers by asking again.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ScanError::DirectoryNotFound { .. } | ScanError::NotADirectory { .. }
        )
    }
}

/// Raised when the yes/no gate does not cover the exact batch.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("confirmation covered {confirmed} file(s) but the batch holds {expected}")]
pub struct ConfirmationError {
    /// Count the user agreed to.
    pub confirmed: usize,
    /// Count actually in the list.
    pub expected: usize,
}
