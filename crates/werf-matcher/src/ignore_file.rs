//! `.dockerignore`-style pattern lists.
//!
//! Patterns are evaluated in order and the last one matching a path (or any
//! of its parent directories) decides; `!pattern` re-includes what earlier
//! patterns ignored.

use std::fmt;

use crate::MatcherError;
use crate::glob::{self, Glob};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnorePattern {
    glob: Glob,
    exclusion: bool,
}

impl IgnorePattern {
    /// Whether this is a `!` negation re-including matched paths.
    pub fn is_exclusion(&self) -> bool {
        self.exclusion
    }
}

impl fmt::Display for IgnorePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exclusion {
            f.write_str("!")?;
        }
        write!(f, "{}", self.glob)
    }
}

/// Keeps every path the ignore pattern list does not ignore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreFileMatcher {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreFileMatcher {
    /// Build from pattern lines, e.g. `["dir", "!dir/keep"]`.
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Result<Self, MatcherError> {
        let mut patterns = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            patterns.extend(parse_line(line.as_ref(), i + 1)?);
        }
        Ok(Self { patterns })
    }

    /// Parse the content of an ignore file.
    ///
    /// ```
    /// use werf_matcher::IgnoreFileMatcher;
    ///
    /// let matcher = IgnoreFileMatcher::parse("# build output\ntarget\n\n!target/keep\n").unwrap();
    /// assert_eq!(matcher.patterns().len(), 2);
    /// assert!(!matcher.is_leaf_matched("target/debug/app"));
    /// assert!(matcher.is_leaf_matched("target/keep"));
    /// ```
    pub fn parse(content: &str) -> Result<Self, MatcherError> {
        let lines: Vec<&str> = content.lines().collect();
        Self::new(&lines)
    }

    pub fn patterns(&self) -> &[IgnorePattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn is_ignored(&self, path: &str) -> bool {
        let mut ignored = false;
        for pattern in &self.patterns {
            // A pattern can only flip the verdict the other way.
            if pattern.exclusion != ignored {
                continue;
            }
            if pattern.glob.matches_path_or_parent(path) {
                ignored = !pattern.exclusion;
            }
        }
        ignored
    }

    /// Patterns still pending below `path` that could flip its verdict:
    /// negations under an ignored directory, ignores under a kept one.
    ///
    /// Ignore patterns never select the directory they stop at (`dir/*`
    /// leaves `dir` itself alone), so even a wildcard-only remainder counts.
    fn has_pending_flips(&self, path: &str, ignored: bool) -> bool {
        let flipping = self
            .patterns
            .iter()
            .filter(|p| p.exclusion == ignored)
            .map(|p| &p.glob);
        !glob::remaining(flipping, path).is_empty()
    }

    pub fn is_path_matched(&self, path: &str) -> bool {
        !self.is_ignored(path) && !self.has_pending_flips(path, false)
    }

    pub fn should_go_through(&self, path: &str) -> bool {
        let ignored = self.is_ignored(path);
        self.has_pending_flips(path, ignored)
    }

    pub fn is_leaf_matched(&self, path: &str) -> bool {
        !self.is_ignored(path)
    }
}

fn parse_line(line: &str, number: usize) -> Result<Vec<IgnorePattern>, MatcherError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(Vec::new());
    }

    let (exclusion, pattern) = match trimmed.strip_prefix('!') {
        Some(rest) => (true, rest.trim()),
        None => (false, trimmed),
    };
    if pattern.is_empty() {
        return Err(MatcherError::InvalidIgnorePattern {
            pattern: trimmed.to_owned(),
            line: number,
            reason: "negation without a pattern",
        });
    }

    let globs = Glob::parse(pattern).map_err(|e| match e {
        MatcherError::InvalidGlobPattern { reason, .. } => MatcherError::InvalidIgnorePattern {
            pattern: trimmed.to_owned(),
            line: number,
            reason,
        },
        other => other,
    })?;
    Ok(globs
        .into_iter()
        .map(|glob| IgnorePattern { glob, exclusion })
        .collect())
}
