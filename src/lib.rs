//! Find and remove temporary/backup files left behind by Microsoft Visio.
//!
//! The pipeline is `scan → select → curate → confirm → delete`:
//!
//! - [`scanner::scan`] walks a directory for files whose names match the
//!   configured [`patterns::PatternSet`].
//! - [`curator::curate`] reconciles the user's choice with that scan and the
//!   live filesystem, producing a [`curator::ConfirmedDeletionList`].
//! - [`curator::ConfirmedDeletionList::confirm`] turns the list into a
//!   [`deleter::DeletionBatch`] only for an explicit yes covering the exact
//!   count, and [`deleter::Deleter::delete_all`] removes it file by file.
//!
//! The terminal wizard, the `scan`/`clean` subcommands and the GUI are thin
//! adapters over these calls.

pub mod app;
pub mod cli;
pub mod config;
pub mod curator;
pub mod deleter;
pub mod error;
pub mod output;
pub mod patterns;
pub mod scanner;
pub mod utils;
pub mod wizard;

pub use config::Settings;
pub use curator::{curate, ConfirmedDeletionList, Curation};
pub use deleter::{DeletionBatch, DeletionOutcome, DeletionReport, Deleter};
pub use error::{ConfigError, ConfirmationError, ScanError};
pub use patterns::PatternSet;
pub use scanner::{scan, FileRecord, ScanOptions, ScanResult};
