use crate::MatcherError;
use crate::glob::{self, Glob};

/// Selects paths matching at least one glob. No globs selects everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeMatcher {
    globs: Vec<Glob>,
}

impl IncludeMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, MatcherError> {
        Ok(Self {
            globs: parse_set(patterns)?,
        })
    }

    pub fn globs(&self) -> &[Glob] {
        &self.globs
    }

    pub fn is_path_matched(&self, path: &str) -> bool {
        self.globs.is_empty() || self.globs.iter().any(|g| g.matches_path(path))
    }

    pub fn should_go_through(&self, path: &str) -> bool {
        if self.is_path_matched(path) {
            return false;
        }
        glob::needs_descent(&glob::remaining(&self.globs, path))
    }

    pub fn is_leaf_matched(&self, path: &str) -> bool {
        self.is_path_matched(path)
    }
}

/// Compile a glob set into its normalized form: expanded, sorted, deduplicated.
pub(crate) fn parse_set<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Glob>, MatcherError> {
    let mut globs = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        globs.extend(Glob::parse(pattern.as_ref())?);
    }
    globs.sort();
    globs.dedup();
    Ok(globs)
}
