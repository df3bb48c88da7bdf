use crate::{
    BasePathMatcher, ExcludeMatcher, IgnoreFileMatcher, IncludeMatcher, MatcherError,
    MultiMatcher, PathMatcher,
};

/// Declarative description of a matcher.
///
/// Globs and ignore patterns are relative to `base_path`.
#[derive(Debug, Clone, Default)]
pub struct MatcherConfig {
    pub base_path: String,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub matchers: Vec<PathMatcher>,
}

impl PathMatcher {
    /// Assemble a matcher from its configuration.
    ///
    /// One matcher is built per non-empty field and the results are ANDed;
    /// a non-root base path then scopes the combination. An empty
    /// configuration selects everything.
    ///
    /// ```
    /// use werf_matcher::{MatcherConfig, PathMatcher};
    ///
    /// let matcher = PathMatcher::new(MatcherConfig {
    ///     base_path: "dir".to_owned(),
    ///     include_globs: vec!["sub-dir".to_owned()],
    ///     exclude_globs: vec!["sub-dir/file1".to_owned()],
    ///     ..Default::default()
    /// })
    /// .unwrap();
    ///
    /// assert!(matcher.is_path_matched("dir/sub-dir/file2"));
    /// assert!(!matcher.is_path_matched("dir/sub-dir/file1"));
    /// assert!(matcher.should_go_through("dir"));
    /// ```
    pub fn new(config: MatcherConfig) -> Result<Self, MatcherError> {
        let mut matchers = Vec::new();
        if !config.include_globs.is_empty() {
            matchers.push(Self::Include(IncludeMatcher::new(&config.include_globs)?));
        }
        if !config.exclude_globs.is_empty() {
            matchers.push(Self::Exclude(ExcludeMatcher::new(&config.exclude_globs)?));
        }
        if !config.ignore_patterns.is_empty() {
            let ignore = IgnoreFileMatcher::new(&config.ignore_patterns)?;
            // A file holding only comments contributes nothing.
            if !ignore.is_empty() {
                matchers.push(Self::IgnoreFile(ignore));
            }
        }
        matchers.extend(config.matchers);

        let combined = match matchers.len() {
            0 => None,
            1 => matchers.pop(),
            _ => Some(Self::Multi(MultiMatcher::new(matchers))),
        };

        let base_path = werf_core::path::normalize(&config.base_path)?;
        let matcher = if base_path.is_empty() {
            combined.unwrap_or(Self::True)
        } else {
            Self::BasePath(BasePathMatcher::new(&base_path, combined)?)
        };

        tracing::trace!(%matcher, "built path matcher");
        Ok(matcher)
    }
}
