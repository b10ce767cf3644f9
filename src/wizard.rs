//! Interactive terminal front end.
//!
//! Generic over its input and output so whole sessions can be driven from
//! tests with in-memory buffers.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::curator::{self, Curation};
use crate::output;
use crate::scanner::{self, ScanResult};
use crate::utils;

pub struct Wizard<'a, R, W> {
    settings: &'a Settings,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Wizard<'a, R, W> {
    pub fn new(settings: &'a Settings, input: R, out: W) -> Self {
        Self {
            settings,
            input,
            out,
        }
    }

    /// Loop until the user exits or input runs out.
    pub fn run(&mut self) -> io::Result<()> {
        output::print_banner(&mut self.out)?;
        output::print_rejected_patterns(&mut self.out, &self.settings.rejected)?;

        loop {
            let Some(dir) = self.ask_directory()? else {
                break;
            };
            self.scan_and_clean(&dir)?;

            if !self.confirm("Scan another location?")? {
                break;
            }
        }

        output::print_info(&mut self.out, "Exiting program.")
    }

    /// `None` on end of input.
    fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.out, "{question} ")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Yes/no question defaulting to no.
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.prompt(&format!("{question} [y/N]"))?;
        Ok(matches!(
            answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }

    fn ask_directory(&mut self) -> io::Result<Option<PathBuf>> {
        let default = self
            .settings
            .default_dir
            .clone()
            .filter(|_| self.settings.default_dir_valid());

        match (&self.settings.default_dir, &default) {
            (Some(configured), None) => output::print_warning(
                &mut self.out,
                &format!(
                    "configured default directory '{}' is invalid or not accessible.",
                    configured.display()
                ),
            )?,
            (None, _) => {
                output::print_warning(&mut self.out, "no default directory configured.")?
            }
            _ => {}
        }

        let question = match &default {
            Some(dir) => format!(
                "Directory to scan [{}] (blank for default, q to exit):",
                dir.display()
            ),
            None => "Directory to scan (q to exit):".to_string(),
        };

        loop {
            let Some(answer) = self.prompt(&question)? else {
                return Ok(None);
            };
            let answer = answer.trim_matches(|c: char| c == '"' || c == '\'' || c == ' ');

            if matches!(answer.to_ascii_lowercase().as_str(), "q" | "quit" | "exit") {
                return Ok(None);
            }

            let candidate = if answer.is_empty() {
                match &default {
                    Some(dir) => dir.clone(),
                    None => {
                        output::print_error(&mut self.out, "input cannot be empty.")?;
                        continue;
                    }
                }
            } else {
                PathBuf::from(answer)
            };

            if !candidate.is_dir() {
                output::print_error(
                    &mut self.out,
                    "path is not a valid directory or does not exist.",
                )?;
                continue;
            }

            let chosen = utils::normalize_path(&candidate);
            output::print_success(
                &mut self.out,
                &format!("Selected directory: {}", chosen.display()),
            )?;
            return Ok(Some(chosen));
        }
    }

    fn scan_and_clean(&mut self, dir: &Path) -> io::Result<()> {
        writeln!(self.out, "Scanning {} for files...", dir.display())?;

        let options = self.settings.scan_options();
        let result = match scanner::scan(dir, &self.settings.patterns, &options) {
            Ok(result) => result,
            Err(e) if e.is_not_found() => {
                output::print_error(&mut self.out, &format!("{e}. Choose another directory."))?;
                return Ok(());
            }
            Err(e) => {
                output::print_error(
                    &mut self.out,
                    &format!("{e}. Try again or pick another directory."),
                )?;
                return Ok(());
            }
        };

        if result.is_empty() {
            for warning in result.warnings() {
                output::print_warning(&mut self.out, warning)?;
            }
            return output::print_success(
                &mut self.out,
                "No matching temporary Visio files found in the specified location.",
            );
        }

        output::print_scan_listing(&mut self.out, &result, true)?;

        let Some(chosen) = self.ask_selection(&result)? else {
            return Ok(());
        };

        let curation = curator::curate(&result, &chosen);
        output::print_dropped(&mut self.out, curation.dropped())?;
        let had_drops = !curation.dropped().is_empty();

        let list = match curation {
            Curation::Confirmed { list, .. } => list,
            Curation::NothingToDelete { .. } => {
                return output::print_info(&mut self.out, "Nothing to delete.");
            }
        };

        if had_drops
            && !self.confirm(&format!(
                "Continue with the remaining {} file(s)?",
                list.len()
            ))?
        {
            return output::print_warning(&mut self.out, "deletion cancelled by user.");
        }

        let count = list.len();
        if !self.confirm(&format!(
            "Delete {count} file(s) ({})? This cannot be undone.",
            utils::format_size(list.total_bytes())
        ))? {
            return output::print_warning(&mut self.out, "deletion cancelled by user.");
        }

        let batch = match list.confirm(count) {
            Ok(batch) => batch,
            Err(e) => return output::print_error(&mut self.out, &e.to_string()),
        };
        let report = self.settings.deleter().delete_all(&batch);
        output::print_report(&mut self.out, &report)
    }

    /// Chosen paths, or `None` when input ran out.
    fn ask_selection(&mut self, result: &ScanResult) -> io::Result<Option<Vec<PathBuf>>> {
        loop {
            let Some(answer) =
                self.prompt("Select files to delete (e.g. 1,3-5 or all; blank to skip):")?
            else {
                return Ok(None);
            };
            match parse_selection(&answer, result.len()) {
                Ok(indices) => {
                    let records = result.records();
                    let paths = indices.into_iter().map(|i| records[i].path.clone());
                    return Ok(Some(paths.collect()));
                }
                Err(msg) => output::print_error(&mut self.out, &msg)?,
            }
        }
    }
}

/// Parse `all`, `none`/blank, or a list like `1,3-5 7` into zero-based
/// indices below `count`, in first-mention order without repeats.
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>, String> {
    let input = input.trim().to_ascii_lowercase();
    match input.as_str() {
        "" | "none" => return Ok(Vec::new()),
        "all" | "*" | "a" => return Ok((0..count).collect()),
        _ => {}
    }

    let parse_number = |s: &str| -> Result<usize, String> {
        let n: usize = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a file number"))?;
        if n == 0 || n > count {
            return Err(format!("{n} is out of range (1-{count})"));
        }
        Ok(n - 1)
    };

    let mut indices = Vec::new();
    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (parse_number(a)?, parse_number(b)?),
            None => {
                let n = parse_number(token)?;
                (n, n)
            }
        };
        if start > end {
            return Err(format!("range '{token}' is backwards"));
        }
        for i in start..=end {
            if !indices.contains(&i) {
                indices.push(i);
            }
        }
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    fn settings() -> Settings {
        colored::control::set_override(false);
        Settings::builtin()
    }

    fn run_session(settings: &Settings, input: &str) -> String {
        let mut out = Vec::new();
        Wizard::new(settings, Cursor::new(input.as_bytes().to_vec()), &mut out)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn visio_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("~$$diagram1.vsdx"), b"one").unwrap();
        fs::write(dir.path().join("~$$diagram2.vsd"), b"two").unwrap();
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();
        dir
    }

    #[test]
    fn test_parse_selection_keywords() {
        assert_eq!(parse_selection("", 3).unwrap(), Vec::<usize>::new());
        assert_eq!(parse_selection("none", 3).unwrap(), Vec::<usize>::new());
        assert_eq!(parse_selection(" ALL ", 3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_selection_lists_and_ranges() {
        assert_eq!(parse_selection("1,3", 3).unwrap(), vec![0, 2]);
        assert_eq!(parse_selection("2-4 1", 5).unwrap(), vec![1, 2, 3, 0]);
        assert_eq!(parse_selection("2,2,1-2", 3).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_parse_selection_rejects_bad_input() {
        assert!(parse_selection("0", 3).is_err());
        assert!(parse_selection("4", 3).is_err());
        assert!(parse_selection("x", 3).is_err());
        assert!(parse_selection("3-1", 3).is_err());
    }

    #[test]
    fn test_session_deletes_selected_files() {
        let dir = visio_dir();
        let settings = settings();
        let input = format!("{}\nall\ny\nn\n", dir.path().display());

        let text = run_session(&settings, &input);

        assert!(text.contains("2 deleted, 0 failed."));
        assert!(!dir.path().join("~$$diagram1.vsdx").exists());
        assert!(!dir.path().join("~$$diagram2.vsd").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_declined_confirmation_deletes_nothing() {
        let dir = visio_dir();
        let settings = settings();
        let input = format!("{}\n1\nn\nn\n", dir.path().display());

        let text = run_session(&settings, &input);

        assert!(text.contains("deletion cancelled by user."));
        assert!(dir.path().join("~$$diagram1.vsdx").exists());
    }

    #[test]
    fn test_blank_selection_is_nothing_to_delete() {
        let dir = visio_dir();
        let settings = settings();
        let input = format!("{}\n\nn\n", dir.path().display());

        let text = run_session(&settings, &input);

        assert!(text.contains("Nothing to delete."));
        assert!(dir.path().join("~$$diagram2.vsd").exists());
    }

    #[test]
    fn test_blank_directory_uses_valid_default() {
        let dir = visio_dir();
        let mut settings = settings();
        settings.default_dir = Some(dir.path().to_path_buf());

        let text = run_session(&settings, "\n2\ny\nn\n");

        assert!(text.contains("1 deleted, 0 failed."));
        assert!(dir.path().join("~$$diagram1.vsdx").exists());
        assert!(!dir.path().join("~$$diagram2.vsd").exists());
    }

    #[test]
    fn test_invalid_directory_is_reprompted() {
        let dir = visio_dir();
        let settings = settings();
        let input = format!(
            "{}\n{}\n\nn\n",
            dir.path().join("missing").display(),
            dir.path().display()
        );

        let text = run_session(&settings, &input);

        assert!(text.contains("path is not a valid directory or does not exist."));
        assert!(text.contains("=== 2 temporary file(s)"));
    }

    #[test]
    fn test_empty_directory_reports_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings();
        let input = format!("{}\nn\n", dir.path().display());

        let text = run_session(&settings, &input);
        assert!(text.contains("No matching temporary Visio files found"));
    }

    #[test]
    fn test_invalid_default_is_announced() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings();
        settings.default_dir = Some(dir.path().join("gone"));

        let text = run_session(&settings, "q\n");
        assert!(text.contains("is invalid or not accessible."));
        assert!(text.contains("Exiting program."));
    }

    #[test]
    fn test_end_of_input_exits_cleanly() {
        let settings = settings();
        let text = run_session(&settings, "");
        assert!(text.contains("Exiting program."));
    }
}
