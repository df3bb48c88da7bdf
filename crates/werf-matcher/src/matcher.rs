use std::fmt;

use sha2::{Digest, Sha256};

use crate::{
    BasePathMatcher, ExcludeMatcher, IgnoreFileMatcher, IncludeMatcher, MatcherError,
    MultiMatcher,
};

/// A tri-state path matcher.
///
/// For any repository-relative path a matcher answers one of:
/// - **matched** ([`is_path_matched`](Self::is_path_matched)): the path and
///   everything beneath it is selected, so a walker can take the whole
///   subtree without looking inside;
/// - **go through** ([`should_go_through`](Self::should_go_through)): the
///   path is not fully selected but some descendants may be, so a walker
///   must descend and ask again for each child;
/// - **rejected**: neither; nothing at or below the path is selected.
///
/// The first two never hold at once. Matchers are immutable and cheap to
/// clone; all validation happens at construction so queries cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PathMatcher {
    #[default]
    True,
    False,
    Include(IncludeMatcher),
    Exclude(ExcludeMatcher),
    IgnoreFile(IgnoreFileMatcher),
    BasePath(BasePathMatcher),
    Multi(MultiMatcher),
}

impl PathMatcher {
    pub fn include<S: AsRef<str>>(globs: &[S]) -> Result<Self, MatcherError> {
        Ok(Self::Include(IncludeMatcher::new(globs)?))
    }

    pub fn exclude<S: AsRef<str>>(globs: &[S]) -> Result<Self, MatcherError> {
        Ok(Self::Exclude(ExcludeMatcher::new(globs)?))
    }

    pub fn ignore_file<S: AsRef<str>>(patterns: &[S]) -> Result<Self, MatcherError> {
        Ok(Self::IgnoreFile(IgnoreFileMatcher::new(patterns)?))
    }

    pub fn base_path(base_path: &str, inner: Option<PathMatcher>) -> Result<Self, MatcherError> {
        Ok(Self::BasePath(BasePathMatcher::new(base_path, inner)?))
    }

    pub fn multi(matchers: Vec<PathMatcher>) -> Self {
        Self::Multi(MultiMatcher::new(matchers))
    }

    /// Whether `path` and its whole subtree are selected.
    pub fn is_path_matched(&self, path: &str) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Include(m) => m.is_path_matched(path),
            Self::Exclude(m) => m.is_path_matched(path),
            Self::IgnoreFile(m) => m.is_path_matched(path),
            Self::BasePath(m) => m.is_path_matched(path),
            Self::Multi(m) => m.is_path_matched(path),
        }
    }

    /// Whether `path` is not fully selected but matching descendants may exist.
    pub fn should_go_through(&self, path: &str) -> bool {
        match self {
            Self::True | Self::False => false,
            Self::Include(m) => m.should_go_through(path),
            Self::Exclude(m) => m.should_go_through(path),
            Self::IgnoreFile(m) => m.should_go_through(path),
            Self::BasePath(m) => m.should_go_through(path),
            Self::Multi(m) => m.should_go_through(path),
        }
    }

    /// Whether a directory or submodule at `path` may hold anything selected.
    pub fn is_dir_or_submodule_path_matched(&self, path: &str) -> bool {
        self.is_path_matched(path) || self.should_go_through(path)
    }

    /// Whether `path` itself is selected when it has no descendants
    /// (a regular file, a symlink, or a worktree status entry).
    ///
    /// Implies `is_path_matched(path) || should_go_through(path)`.
    pub fn is_leaf_matched(&self, path: &str) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Include(m) => m.is_leaf_matched(path),
            Self::Exclude(m) => m.is_leaf_matched(path),
            Self::IgnoreFile(m) => m.is_leaf_matched(path),
            Self::BasePath(m) => m.is_leaf_matched(path),
            Self::Multi(m) => m.is_leaf_matched(path),
        }
    }

    /// Stable hex digest of the matcher's normalized configuration.
    ///
    /// Neutral matchers (`True`, an empty `Multi`) yield the empty string so
    /// they do not split cache namespaces.
    pub fn id(&self) -> String {
        match self {
            Self::True => String::new(),
            Self::False => digest("false", std::iter::empty::<&[u8]>()),
            Self::Include(m) => digest(
                "include",
                m.globs().iter().map(|g| g.to_string().into_bytes()),
            ),
            Self::Exclude(m) => digest(
                "exclude",
                m.globs().iter().map(|g| g.to_string().into_bytes()),
            ),
            Self::IgnoreFile(m) => digest(
                "ignore-file",
                m.patterns().iter().map(|p| p.to_string().into_bytes()),
            ),
            Self::BasePath(m) => digest(
                "base-path",
                [
                    m.base_path().as_bytes().to_vec(),
                    m.inner().map(PathMatcher::id).unwrap_or_default().into_bytes(),
                ],
            ),
            Self::Multi(m) => {
                let ids: Vec<String> = m
                    .matchers()
                    .iter()
                    .map(PathMatcher::id)
                    .filter(|id| !id.is_empty())
                    .collect();
                if ids.is_empty() {
                    String::new()
                } else {
                    digest("multi", ids.iter().map(String::as_bytes))
                }
            }
        }
    }
}

fn digest<I>(kind: &str, parts: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    for part in parts {
        hasher.update([0u8]);
        hasher.update(part.as_ref());
    }
    hex::encode(hasher.finalize())
}

impl fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("True"),
            Self::False => f.write_str("False"),
            Self::Include(m) => write_list(f, "Include", m.globs()),
            Self::Exclude(m) => write_list(f, "Exclude", m.globs()),
            Self::IgnoreFile(m) => write_list(f, "IgnoreFile", m.patterns()),
            Self::BasePath(m) => match m.inner() {
                Some(inner) => write!(f, "BasePath({:?}, {inner})", m.base_path()),
                None => write!(f, "BasePath({:?})", m.base_path()),
            },
            Self::Multi(m) => write_list(f, "Multi", m.matchers()),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, name: &str, items: &[T]) -> fmt::Result {
    write!(f, "{name}([")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("])")
}
