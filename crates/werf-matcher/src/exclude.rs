use crate::MatcherError;
use crate::glob::{self, Glob};
use crate::include::parse_set;

/// Keeps every path except those matching an exclude glob.
///
/// A directory only counts as matched when no exclude glob is still pending
/// beneath it; otherwise the walker has to descend and check its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludeMatcher {
    globs: Vec<Glob>,
}

impl ExcludeMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, MatcherError> {
        Ok(Self {
            globs: parse_set(patterns)?,
        })
    }

    pub fn globs(&self) -> &[Glob] {
        &self.globs
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.globs.iter().any(|g| g.matches_path(path))
    }

    fn has_pending_exclusions(&self, path: &str) -> bool {
        glob::needs_descent(&glob::remaining(&self.globs, path))
    }

    pub fn is_path_matched(&self, path: &str) -> bool {
        !self.is_excluded(path) && !self.has_pending_exclusions(path)
    }

    pub fn should_go_through(&self, path: &str) -> bool {
        !self.is_excluded(path) && self.has_pending_exclusions(path)
    }

    pub fn is_leaf_matched(&self, path: &str) -> bool {
        !self.is_excluded(path)
    }
}
