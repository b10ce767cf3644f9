use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "visio-tidy",
    about = "Find and remove Visio temporary/backup files",
    version
)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log per-file decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Runs the interactive wizard when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Interactive scan → select → confirm → delete wizard
    Wizard,

    /// List matching temporary files (no deletion)
    Scan {
        /// Directory to scan; defaults to `default_scan_path` from the config
        path: Option<PathBuf>,

        /// Print the records as JSON
        #[arg(long)]
        json: bool,

        /// Only look at the top-level directory
        #[arg(long)]
        no_recursive: bool,
    },

    /// Delete every matching temporary file (requires --confirm <COUNT> to actually delete)
    Clean {
        /// Directory to clean; defaults to `default_scan_path` from the config
        path: Option<PathBuf>,

        /// Delete the files, agreeing to exactly COUNT of them as listed by a
        /// dry run. Without this flag, behaves like scan.
        #[arg(long, value_name = "COUNT")]
        confirm: Option<usize>,

        /// Only look at the top-level directory
        #[arg(long)]
        no_recursive: bool,
    },

    /// Open the desktop interface
    Gui,
}
