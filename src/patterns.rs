//! Filename pattern matching for Visio temporary/backup files.
//!
//! Matching is case-insensitive on every platform and is applied to the final
//! path component only. Patterns must pass [`is_safe_pattern`] before they are
//! admitted to a [`PatternSet`].

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

/// Patterns used when no configuration supplies any.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "~$$*.vssx",
    "~$$*.vsdx",
    "~$$*.vstx",
    "~$$*.vsdm",
    "~$$*.vsd",
];

/// Only `[A-Za-z0-9~$*.\-_]` is allowed. Note that `?` is outside the class,
/// so a `?` wildcard is honored by [`matches`] but never passes validation.
pub fn is_safe_pattern(pattern: &str) -> bool {
    !pattern.is_empty()
        && pattern
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '~' | '$' | '*' | '.' | '-' | '_'))
}

/// Shell-style match of `filename` against a single glob.
///
/// `*` matches any run (including empty), `?` exactly one character.
/// A pattern that cannot be compiled matches nothing.
pub fn matches(filename: &str, pattern: &str) -> bool {
    compile(pattern)
        .map(|m| m.is_match(filename))
        .unwrap_or(false)
}

fn compile(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(true)
        .backslash_escape(false)
        .build()
        .map(|glob| glob.compile_matcher())
}

/// Why a candidate pattern was left out of the active set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Contains a character outside the safe class.
    UnsafeCharacters,
    /// Safe characters, but rejected by the glob compiler.
    InvalidGlob(String),
}

/// A candidate pattern that was dropped, kept so callers can report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPattern {
    pub pattern: String,
    pub reason: RejectReason,
}

impl fmt::Display for RejectedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectReason::UnsafeCharacters => {
                write!(f, "ignoring potentially unsafe pattern: {}", self.pattern)
            }
            RejectReason::InvalidGlob(err) => {
                write!(f, "ignoring invalid pattern {}: {err}", self.pattern)
            }
        }
    }
}

/// One validated, compiled pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    matcher: GlobMatcher,
}

impl Pattern {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, filename: &str) -> bool {
        self.matcher.is_match(filename)
    }
}

/// Ordered collection of patterns that all passed validation.
///
/// An empty set is representable so that the scanner can refuse it with a
/// configuration-style error instead of silently finding nothing.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Validate and compile `candidates`, keeping input order and dropping
    /// duplicates. Rejected patterns are returned and logged, never used.
    pub fn from_candidates<I, S>(candidates: I) -> (Self, Vec<RejectedPattern>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<Pattern> = Vec::new();
        let mut rejected = Vec::new();

        for candidate in candidates {
            let raw = candidate.as_ref();
            if !is_safe_pattern(raw) {
                tracing::warn!(pattern = raw, "ignoring potentially unsafe pattern");
                rejected.push(RejectedPattern {
                    pattern: raw.to_string(),
                    reason: RejectReason::UnsafeCharacters,
                });
                continue;
            }
            if patterns.iter().any(|p| p.raw == raw) {
                continue;
            }
            match compile(raw) {
                Ok(matcher) => patterns.push(Pattern {
                    raw: raw.to_string(),
                    matcher,
                }),
                Err(e) => {
                    tracing::warn!(pattern = raw, error = %e, "ignoring invalid pattern");
                    rejected.push(RejectedPattern {
                        pattern: raw.to_string(),
                        reason: RejectReason::InvalidGlob(e.kind().to_string()),
                    });
                }
            }
        }

        (Self { patterns }, rejected)
    }

    /// The built-in Visio patterns.
    pub fn defaults() -> Self {
        Self::from_candidates(DEFAULT_PATTERNS.iter().copied()).0
    }

    /// First pattern that matches `filename`, if any.
    pub fn matching(&self, filename: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.is_match(filename))
    }

    pub fn is_match(&self, filename: &str) -> bool {
        self.matching(filename).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Raw pattern strings, for display.
    pub fn to_strings(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.raw.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_pattern_accepts_visio_globs() {
        for p in DEFAULT_PATTERNS {
            assert!(is_safe_pattern(p), "{p} should be safe");
        }
        assert!(is_safe_pattern("~$*.~vsdx"));
        assert!(is_safe_pattern("backup_01-old.vsd"));
    }

    #[test]
    fn test_safe_pattern_rejects_control_syntax() {
        for p in [
            "",
            "*.vsd; rm -rf /",
            "$(whoami).vsd",
            "a b.vsd",
            "file?.vsd",
            "[ab].vsd",
            "dir/*.vsd",
            "dir\\*.vsd",
            "`x`",
            "\"*.vsd\"",
            "'*.vsd'",
            "{a,b}.vsd",
            "é.vsd",
        ] {
            assert!(!is_safe_pattern(p), "{p:?} should be rejected");
        }
    }

    #[test]
    fn test_star_matches_any_run() {
        assert!(matches("~$$diagram1.vsdx", "~$$*.vsdx"));
        assert!(matches("~$$.vsdx", "~$$*.vsdx"));
        assert!(!matches("diagram1.vsdx", "~$$*.vsdx"));
        assert!(!matches("~$$diagram1.vsdx.bak", "~$$*.vsdx"));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        assert!(matches("a1.vsd", "a?.vsd"));
        assert!(!matches("a.vsd", "a?.vsd"));
        assert!(!matches("a12.vsd", "a?.vsd"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(matches("~$$DIAGRAM.VSDX", "~$$*.vsdx"));
        assert!(matches("~$$diagram.vsdx", "~$$*.VSDX"));
    }

    #[test]
    fn test_dollar_and_tilde_are_literal() {
        assert!(!matches("~$diagram.vsdx", "~$$*.vsdx"));
        assert!(matches("~$diagram.vsdx", "~$*.vsdx"));
        assert!(!matches("x$$diagram.vsdx", "~$$*.vsdx"));
    }

    #[test]
    fn test_vsd_pattern_does_not_match_vsdx() {
        assert!(!matches("~$$a.vsdx", "~$$*.vsd"));
    }

    #[test]
    fn test_from_candidates_drops_unsafe_and_keeps_order() {
        let (set, rejected) =
            PatternSet::from_candidates(["~$$*.vsdx", "evil;rm", "~$$*.vsd", "~$$*.vsdx"]);

        assert_eq!(set.to_strings(), vec!["~$$*.vsdx", "~$$*.vsd"]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].pattern, "evil;rm");
        assert_eq!(rejected[0].reason, RejectReason::UnsafeCharacters);
    }

    #[test]
    fn test_surrounding_whitespace_is_rejected_not_trimmed() {
        let (set, rejected) = PatternSet::from_candidates([" ~$$*.vsd ", "~$$*.vsdx"]);
        assert_eq!(set.to_strings(), vec!["~$$*.vsdx"]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].pattern, " ~$$*.vsd ");
        assert_eq!(rejected[0].reason, RejectReason::UnsafeCharacters);
    }

    #[test]
    fn test_all_unsafe_yields_empty_set() {
        let (set, rejected) = PatternSet::from_candidates(["a b", "c|d"]);
        assert!(set.is_empty());
        assert_eq!(rejected.len(), 2);
    }

    #[test]
    fn test_set_match_reports_first_pattern() {
        let set = PatternSet::defaults();
        assert_eq!(set.len(), DEFAULT_PATTERNS.len());
        assert_eq!(
            set.matching("~$$shapes.vssx").map(Pattern::as_str),
            Some("~$$*.vssx")
        );
        assert!(!set.is_match("notes.txt"));
    }

    #[test]
    fn test_rejected_display_names_pattern() {
        let (_, rejected) = PatternSet::from_candidates(["bad pattern"]);
        assert_eq!(
            rejected[0].to_string(),
            "ignoring potentially unsafe pattern: bad pattern"
        );
    }
}
