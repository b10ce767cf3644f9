//! Configuration document loading.
//!
//! The document is JSON:
//!
//! ```json
//! {
//!   "temp_file_patterns": ["~$$*.vsdx", "~$$*.vsd"],
//!   "default_scan_path": "Z:\\ENGINEERING TEMPLATES",
//!   "scan_timeout_secs": 30
//! }
//! ```
//!
//! Unknown keys are ignored. Loading yields an explicit [`Settings`] value that
//! is handed to the scanner, curator and deleter; nothing is global.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::deleter::Deleter;
use crate::error::ConfigError;
use crate::patterns::{PatternSet, RejectedPattern, DEFAULT_PATTERNS};
use crate::scanner::ScanOptions;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR_NAME: &str = "visio-tidy";

/// Raw on-disk shape. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub temp_file_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub default_scan_path: Option<String>,
    #[serde(default)]
    pub scan_timeout_secs: Option<u64>,
    #[serde(default)]
    pub delete_timeout_secs: Option<u64>,
    #[serde(default)]
    pub protected_directories: Vec<PathBuf>,
}

/// Where the active settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    BuiltIn,
}

/// Validated configuration passed into the pipeline at call time.
#[derive(Debug, Clone)]
pub struct Settings {
    pub patterns: PatternSet,
    /// Patterns dropped during validation, for the caller to report.
    pub rejected: Vec<RejectedPattern>,
    /// Directory hint to pre-offer. May point somewhere that no longer exists.
    pub default_dir: Option<PathBuf>,
    /// `None` disables the deadline (configured as 0).
    pub scan_timeout: Option<Duration>,
    pub delete_timeout: Option<Duration>,
    /// Extra deny-list entries on top of the platform defaults.
    pub protected_dirs: Vec<PathBuf>,
    pub source: ConfigSource,
}

impl Settings {
    /// Settings used when no config file is found.
    pub fn builtin() -> Self {
        Self {
            patterns: PatternSet::defaults(),
            rejected: Vec::new(),
            default_dir: None,
            scan_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            delete_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            protected_dirs: Vec::new(),
            source: ConfigSource::BuiltIn,
        }
    }

    /// Resolve and load the configuration.
    ///
    /// An explicit path must exist. Otherwise the first of `./config.json`,
    /// `<exe dir>/config.json` and `<config dir>/visio-tidy/config.json` that
    /// exists is used, falling back to [`Settings::builtin`].
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_file(path);
        }

        match candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::debug!("no configuration file found, using built-in patterns");
                Ok(Self::builtin())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&text, path)?;
        tracing::info!(
            path = %path.display(),
            patterns = settings.patterns.len(),
            rejected = settings.rejected.len(),
            "loaded configuration"
        );
        Ok(settings)
    }

    /// Parse `text` as a config document; `path` is only used in errors and
    /// as the recorded source.
    pub fn from_json_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let doc: ConfigFile =
            serde_json::from_str(text).map_err(|source| ConfigError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_document(doc, ConfigSource::File(path.to_path_buf()))
    }

    pub fn from_document(doc: ConfigFile, source: ConfigSource) -> Result<Self, ConfigError> {
        let (patterns, rejected) = match doc.temp_file_patterns {
            Some(list) => PatternSet::from_candidates(list),
            None => PatternSet::from_candidates(DEFAULT_PATTERNS.iter().copied()),
        };
        if patterns.is_empty() {
            return Err(ConfigError::NoSafePatterns);
        }

        let default_dir = doc
            .default_scan_path
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            patterns,
            rejected,
            default_dir,
            scan_timeout: timeout_from_secs(doc.scan_timeout_secs),
            delete_timeout: timeout_from_secs(doc.delete_timeout_secs),
            protected_dirs: doc.protected_directories,
            source,
        })
    }

    /// True when a default directory is configured and currently exists.
    pub fn default_dir_valid(&self) -> bool {
        self.default_dir.as_deref().is_some_and(Path::is_dir)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            timeout: self.scan_timeout,
            ..ScanOptions::default()
        }
    }

    /// A deleter bound to these patterns, deadline and deny-list.
    pub fn deleter(&self) -> Deleter {
        Deleter::new(self.patterns.clone())
            .with_timeout(self.delete_timeout)
            .with_protected_dirs(self.protected_dirs.iter().cloned())
    }
}

fn timeout_from_secs(secs: Option<u64>) -> Option<Duration> {
    match secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
        0 => None,
        n => Some(Duration::from_secs(n)),
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Settings, ConfigError> {
        Settings::from_json_str(text, Path::new("config.json"))
    }

    #[test]
    fn test_full_document() {
        let settings = parse(
            r#"{
                "temp_file_patterns": ["~$$*.vsdx", "~$$*.vsd"],
                "default_scan_path": "/srv/visio",
                "powershell_scripts_path": "scripts",
                "scan_timeout_secs": 5,
                "delete_timeout_secs": 0,
                "protected_directories": ["/srv/keep"]
            }"#,
        )
        .unwrap();

        assert_eq!(settings.patterns.to_strings(), vec!["~$$*.vsdx", "~$$*.vsd"]);
        assert_eq!(settings.default_dir, Some(PathBuf::from("/srv/visio")));
        assert_eq!(settings.scan_timeout, Some(Duration::from_secs(5)));
        assert_eq!(settings.delete_timeout, None);
        assert_eq!(settings.protected_dirs, vec![PathBuf::from("/srv/keep")]);
        assert_eq!(settings.source, ConfigSource::File(PathBuf::from("config.json")));
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let settings = parse("{}").unwrap();
        assert_eq!(settings.patterns.len(), DEFAULT_PATTERNS.len());
        assert_eq!(settings.default_dir, None);
        assert_eq!(
            settings.scan_timeout,
            Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        );
    }

    #[test]
    fn test_unsafe_patterns_are_reported_not_fatal() {
        let settings = parse(r#"{"temp_file_patterns": ["~$$*.vsd", "x; del *"]}"#).unwrap();
        assert_eq!(settings.patterns.len(), 1);
        assert_eq!(settings.rejected.len(), 1);
        assert_eq!(settings.rejected[0].pattern, "x; del *");
    }

    #[test]
    fn test_no_safe_patterns_is_invalid() {
        let err = parse(r#"{"temp_file_patterns": ["a b", "c|d"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoSafePatterns));

        let err = parse(r#"{"temp_file_patterns": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoSafePatterns));
    }

    #[test]
    fn test_patterns_must_be_a_list() {
        let err = parse(r#"{"temp_file_patterns": "~$$*.vsd"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }));
    }

    #[test]
    fn test_default_path_must_be_string() {
        let err = parse(r#"{"default_scan_path": 42}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }));

        let settings = parse(r#"{"default_scan_path": ""}"#).unwrap();
        assert_eq!(settings.default_dir, None);
        let settings = parse(r#"{"default_scan_path": null}"#).unwrap();
        assert_eq!(settings.default_dir, None);
    }

    #[test]
    fn test_malformed_json() {
        let err = parse("{ not json").unwrap_err();
        assert!(err.to_string().contains("could not decode JSON"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("missing.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"temp_file_patterns": ["~$$*.vstx"]}"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.patterns.to_strings(), vec!["~$$*.vstx"]);
    }

    #[test]
    fn test_default_dir_validity() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::builtin();
        assert!(!settings.default_dir_valid());

        settings.default_dir = Some(dir.path().join("gone"));
        assert!(!settings.default_dir_valid());

        settings.default_dir = Some(dir.path().to_path_buf());
        assert!(settings.default_dir_valid());
    }
}
