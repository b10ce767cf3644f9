use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use visio_tidy::cli::{Cli, Command};
use visio_tidy::config::Settings;
use visio_tidy::curator::{self, Curation};
use visio_tidy::scanner::{self, ScanOptions, ScanResult};
use visio_tidy::wizard::Wizard;
use visio_tidy::{app, output};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("invalid configuration")?;

    match cli.command {
        None | Some(Command::Wizard) => {
            let stdin = io::stdin();
            Wizard::new(&settings, stdin.lock(), io::stdout().lock()).run()?;
        }
        Some(Command::Scan {
            path,
            json,
            no_recursive,
        }) => run_scan(&settings, path, json, no_recursive)?,
        Some(Command::Clean {
            path,
            confirm,
            no_recursive,
        }) => run_clean(&settings, path, confirm, no_recursive)?,
        Some(Command::Gui) => app::run(settings).map_err(|e| anyhow!(e.to_string()))?,
    }

    Ok(())
}

/// Log to stderr so it never mixes with listings or JSON on stdout.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "visio_tidy=debug"
    } else {
        "visio_tidy=error"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn scan_target(
    settings: &Settings,
    path: Option<PathBuf>,
    no_recursive: bool,
) -> Result<ScanResult> {
    let Some(root) = path.or_else(|| settings.default_dir.clone()) else {
        bail!("no directory given and no default_scan_path configured");
    };
    let options = ScanOptions {
        recursive: !no_recursive,
        ..settings.scan_options()
    };
    scanner::scan(&root, &settings.patterns, &options)
        .with_context(|| format!("scan of '{}' failed", root.display()))
}

fn run_scan(
    settings: &Settings,
    path: Option<PathBuf>,
    json: bool,
    no_recursive: bool,
) -> Result<()> {
    let result = scan_target(settings, path, no_recursive)?;
    let mut out = io::stdout().lock();

    if json {
        // Keep stdout pure JSON; rejected patterns are still reported.
        output::print_rejected_patterns(&mut io::stderr().lock(), &settings.rejected)?;
        writeln!(out, "{}", serde_json::to_string_pretty(result.records())?)?;
        return Ok(());
    }

    output::print_rejected_patterns(&mut out, &settings.rejected)?;
    if result.is_empty() {
        output::print_success(
            &mut out,
            "No matching temporary Visio files found in the specified location.",
        )?;
        return Ok(());
    }
    output::print_scan_listing(&mut out, &result, false)?;
    Ok(())
}

fn run_clean(
    settings: &Settings,
    path: Option<PathBuf>,
    confirm: Option<usize>,
    no_recursive: bool,
) -> Result<()> {
    let result = scan_target(settings, path, no_recursive)?;
    let mut out = io::stdout().lock();
    output::print_rejected_patterns(&mut out, &settings.rejected)?;

    if result.is_empty() {
        output::print_success(
            &mut out,
            "No matching temporary Visio files found in the specified location.",
        )?;
        return Ok(());
    }

    let Some(confirmed) = confirm else {
        output::print_no_confirm_warning(&mut out)?;
        output::print_scan_listing(&mut out, &result, false)?;
        output::print_dry_run_footer(&mut out, result.len())?;
        return Ok(());
    };

    let curation = curator::curate(&result, &result.paths());
    output::print_dropped(&mut out, curation.dropped())?;
    let list = match curation {
        Curation::Confirmed { list, .. } => list,
        Curation::NothingToDelete { .. } => {
            output::print_info(&mut out, "Nothing to delete.")?;
            return Ok(());
        }
    };

    // The count given to --confirm must cover exactly the files about to go.
    let batch = list
        .confirm(confirmed)
        .context("refusing to delete; run without --confirm to list the files again")?;
    let report = settings.deleter().delete_all(&batch);
    output::print_report(&mut out, &report)?;
    Ok(())
}
