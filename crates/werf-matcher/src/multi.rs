use crate::PathMatcher;

/// Boolean AND over an ordered list of matchers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiMatcher {
    matchers: Vec<PathMatcher>,
}

impl MultiMatcher {
    pub fn new(matchers: Vec<PathMatcher>) -> Self {
        Self { matchers }
    }

    pub fn matchers(&self) -> &[PathMatcher] {
        &self.matchers
    }

    pub fn is_path_matched(&self, path: &str) -> bool {
        self.matchers.iter().all(|m| m.is_path_matched(path))
    }

    /// Descend when some matcher needs it and none has already rejected
    /// `path` together with everything below it.
    pub fn should_go_through(&self, path: &str) -> bool {
        let mut needs_descent = false;
        for matcher in &self.matchers {
            if matcher.should_go_through(path) {
                needs_descent = true;
            } else if !matcher.is_path_matched(path) {
                return false;
            }
        }
        needs_descent
    }

    pub fn is_leaf_matched(&self, path: &str) -> bool {
        self.matchers.iter().all(|m| m.is_leaf_matched(path))
    }
}
