use werf_core::path;

use crate::{MatcherError, PathMatcher};

/// Scopes an optional inner matcher to a base directory or file.
///
/// The inner matcher sees paths relative to the base, so it never needs to
/// know where it is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePathMatcher {
    base_path: String,
    inner: Option<Box<PathMatcher>>,
}

impl BasePathMatcher {
    pub fn new(base_path: &str, inner: Option<PathMatcher>) -> Result<Self, MatcherError> {
        Ok(Self {
            base_path: path::normalize(base_path)?,
            inner: inner.map(Box::new),
        })
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn inner(&self) -> Option<&PathMatcher> {
        self.inner.as_deref()
    }

    pub fn is_path_matched(&self, path: &str) -> bool {
        path::relative_to(&self.base_path, path).is_some_and(|relative| {
            self.inner
                .as_ref()
                .is_none_or(|inner| inner.is_path_matched(relative))
        })
    }

    pub fn should_go_through(&self, path: &str) -> bool {
        if path::is_strict_ancestor(path, &self.base_path) {
            return true;
        }
        match (path::relative_to(&self.base_path, path), &self.inner) {
            (Some(relative), Some(inner)) => inner.should_go_through(relative),
            _ => false,
        }
    }

    pub fn is_leaf_matched(&self, path: &str) -> bool {
        path::relative_to(&self.base_path, path).is_some_and(|relative| {
            self.inner
                .as_ref()
                .is_none_or(|inner| inner.is_leaf_matched(relative))
        })
    }
}
