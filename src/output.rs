use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;

use crate::curator::DroppedPath;
use crate::deleter::{DeletionOutcome, DeletionReport};
use crate::patterns::RejectedPattern;
use crate::scanner::{FileRecord, ScanResult};
use crate::utils;

pub fn print_banner(out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        "Welcome to the Visio Temporary File Remover!".bold().cyan()
    )?;
    writeln!(out)
}

pub fn print_warning(out: &mut impl Write, msg: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "Warning:".yellow().bold(), msg.yellow())
}

pub fn print_error(out: &mut impl Write, msg: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "Error:".red().bold(), msg.red())
}

pub fn print_info(out: &mut impl Write, msg: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "Info:".cyan().bold(), msg)
}

pub fn print_success(out: &mut impl Write, msg: &str) -> io::Result<()> {
    writeln!(out, "{}", msg.green())
}

pub fn print_rejected_patterns(
    out: &mut impl Write,
    rejected: &[RejectedPattern],
) -> io::Result<()> {
    for r in rejected {
        print_warning(out, &r.to_string())?;
    }
    Ok(())
}

pub fn print_scan_header(out: &mut impl Write, root: &Path, count: usize) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!("=== {} temporary file(s) in {} ===", count, root.display())
            .bold()
            .white()
    )
}

/// One line per record: `[n] name (in folder)  size`. `index` is 1-based.
pub fn print_scan_entry(
    out: &mut impl Write,
    index: Option<usize>,
    record: &FileRecord,
    root: &Path,
) -> io::Result<()> {
    let number = index
        .map(|i| format!("[{i:>3}] "))
        .unwrap_or_default();
    writeln!(
        out,
        "  {}{} {}  {}",
        number.bold(),
        record.name,
        format!("(in {})", utils::relative_parent(&record.path, root)).dimmed(),
        utils::format_optional_size(record.size_bytes).yellow()
    )
}

pub fn print_scan_listing(
    out: &mut impl Write,
    result: &ScanResult,
    numbered: bool,
) -> io::Result<()> {
    print_scan_header(out, result.root(), result.len())?;
    for (i, record) in result.records().iter().enumerate() {
        print_scan_entry(out, numbered.then_some(i + 1), record, result.root())?;
    }
    print_separator(out)?;
    writeln!(
        out,
        "  {:<30} {}",
        "Total size:".bold(),
        utils::format_size(result.total_bytes()).green()
    )?;
    for warning in result.warnings() {
        print_warning(out, warning)?;
    }
    writeln!(out)
}

pub fn print_separator(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "  {}", "─".repeat(45).dimmed())
}

pub fn print_dropped(out: &mut impl Write, dropped: &[DroppedPath]) -> io::Result<()> {
    if dropped.is_empty() {
        return Ok(());
    }
    print_warning(out, "the following selections are no longer available:")?;
    for d in dropped {
        writeln!(
            out,
            "  - {} {}",
            d.path.display(),
            format!("({})", d.reason).dimmed()
        )?;
    }
    Ok(())
}

pub fn print_deleted(out: &mut impl Write, path: &Path, size: &str) -> io::Result<()> {
    writeln!(
        out,
        "  {} {}  {}",
        "Deleted".green(),
        path.display().to_string().dimmed(),
        size.yellow()
    )
}

pub fn print_delete_error(out: &mut impl Write, path: &Path, err: &str) -> io::Result<()> {
    writeln!(
        out,
        "  {} {}: {}",
        "Failed".red().bold(),
        path.display().to_string().dimmed(),
        err.red()
    )
}

/// Per-path results, the batch failure if any, and the summary line.
/// The summary is printed even when everything succeeded.
pub fn print_report(out: &mut impl Write, report: &DeletionReport) -> io::Result<()> {
    for entry in report.entries() {
        match &entry.outcome {
            DeletionOutcome::Deleted => {
                print_deleted(out, &entry.path, &utils::format_size(entry.freed_bytes))?
            }
            DeletionOutcome::Failed(reason) => print_delete_error(out, &entry.path, reason)?,
        }
    }
    if let Some(failure) = report.batch_failure() {
        print_error(
            out,
            &format!(
                "{} ({} file(s) were not attempted)",
                failure.reason, failure.unattempted
            ),
        )?;
    }
    writeln!(out)?;
    print_summary(out, report)
}

pub fn print_summary(out: &mut impl Write, report: &DeletionReport) -> io::Result<()> {
    let counts = format!(
        "{} deleted, {} failed.",
        report.deleted_count(),
        report.failed_count()
    );
    let counts = if report.is_complete_success() {
        counts.green()
    } else {
        counts.yellow()
    };
    writeln!(
        out,
        "{} {} {}",
        "Summary:".bold(),
        counts,
        format!("({} freed)", utils::format_size(report.freed_bytes())).dimmed()
    )
}

/// `count` is the number of files listed, i.e. what `--confirm` must repeat.
pub fn print_dry_run_footer(out: &mut impl Write, count: usize) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!("This was a dry run. Run `visio-tidy clean --confirm {count}` to delete.")
            .yellow()
            .bold()
    )
}

pub fn print_no_confirm_warning(out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        "No --confirm flag provided. Running as dry-run scan."
            .yellow()
            .bold()
    )?;
    writeln!(out)
}
