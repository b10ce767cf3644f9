use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local, Utc};

/// Resolve `path` to a normalized absolute form.
///
/// Uses the filesystem when the path exists (symlinks resolved), otherwise
/// falls back to [`normalize_lexically`] against the current directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return strip_verbatim(canonical);
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    normalize_lexically(&absolute)
}

/// Drop `.` segments, fold `..` into its parent and lose trailing separators,
/// without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root / prefix.
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `fs::canonicalize` on Windows yields `\\?\C:\...`; keep the familiar form.
#[cfg(windows)]
fn strip_verbatim(path: PathBuf) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{rest}"));
    }
    if let Some(rest) = text.strip_prefix(r"\\?\") {
        return PathBuf::from(rest);
    }
    path
}

#[cfg(not(windows))]
fn strip_verbatim(path: PathBuf) -> PathBuf {
    path
}

/// Format byte count as human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1_024 {
        format!("{:.2} KB", bytes as f64 / 1_024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Size column text; unknown sizes render as "Unknown".
pub fn format_optional_size(bytes: Option<u64>) -> String {
    bytes.map(format_size).unwrap_or_else(|| "Unknown".to_string())
}

/// Local-time rendering of a modification timestamp.
pub fn format_modified(modified: Option<DateTime<Utc>>) -> String {
    match modified {
        Some(ts) => DateTime::<Local>::from(ts)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "Unknown".to_string(),
    }
}

/// Parent folder of `path` relative to `base`, `"."` when it sits directly
/// in `base`, or the absolute parent when it is outside `base`.
pub fn relative_parent(path: &Path, base: &Path) -> String {
    let parent = path.parent().unwrap_or(path);
    match parent.strip_prefix(base) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => parent.display().to_string(),
    }
}

/// Shorten a path for display by replacing home dir with ~.
pub fn display_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(relative) => format!("~/{}", relative.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1_023), "1023 B");
        assert_eq!(format_size(1_536), "1.50 KB");
        assert_eq!(format_size(5 * 1_048_576), "5.00 MB");
        assert_eq!(format_size(2 * 1_073_741_824), "2.00 GB");
    }

    #[test]
    fn test_format_optional_size_unknown() {
        assert_eq!(format_optional_size(None), "Unknown");
        assert_eq!(format_optional_size(Some(10)), "10 B");
    }

    #[test]
    fn test_normalize_lexically_resolves_segments() {
        let base = std::env::temp_dir();
        let messy = base.join("a").join(".").join("b").join("..").join("c");
        assert_eq!(normalize_lexically(&messy), base.join("a").join("c"));
    }

    #[test]
    fn test_normalize_lexically_drops_trailing_separator() {
        let base = std::env::temp_dir();
        let with_slash = PathBuf::from(format!(
            "{}{}",
            base.join("dir").display(),
            std::path::MAIN_SEPARATOR
        ));
        assert_eq!(normalize_lexically(&with_slash), base.join("dir"));
    }

    #[test]
    fn test_normalize_path_canonicalizes_existing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.vsd");
        std::fs::write(&file, b"x").unwrap();

        let via_dots = dir.path().join(".").join("x.vsd");
        assert_eq!(normalize_path(&via_dots), normalize_path(&file));
    }

    #[test]
    fn test_relative_parent() {
        let base = std::env::temp_dir().join("root");
        assert_eq!(relative_parent(&base.join("f.vsd"), &base), ".");
        assert_eq!(
            relative_parent(&base.join("sub").join("f.vsd"), &base),
            Path::new("sub").display().to_string()
        );
        let elsewhere = std::env::temp_dir().join("other").join("f.vsd");
        assert_eq!(
            relative_parent(&elsewhere, &base),
            elsewhere.parent().unwrap().display().to_string()
        );
    }

    #[test]
    fn test_format_modified_unknown() {
        assert_eq!(format_modified(None), "Unknown");
    }
}
