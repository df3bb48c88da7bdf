//! Repository-relative path helpers.
//!
//! Every path handled by matchers and walkers is relative to a repository
//! root, `/`-separated, without leading or trailing separators. The root
//! itself is the empty string, and every other path is its descendant.

use crate::{Error, Result};

/// Clean a user-supplied path into its canonical repository-relative form.
///
/// Empty segments and `.` are dropped, `..` pops the previous segment, and
/// a leading `/` is ignored. A `..` that would climb above the root is
/// rejected.
///
/// ```
/// use werf_core::path::normalize;
///
/// assert_eq!(normalize("./dir//sub/").unwrap(), "dir/sub");
/// assert_eq!(normalize("/a/b/../c").unwrap(), "a/c");
/// assert_eq!(normalize(".").unwrap(), "");
/// assert!(normalize("../outside").is_err());
/// ```
pub fn normalize(path: &str) -> Result<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::InvalidPath {
                        path: path.to_owned(),
                        reason: "escapes the repository root",
                    });
                }
            }
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

/// Iterate over the segments of a normalized path. The root yields nothing.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Join a child name onto a normalized parent path.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else if name.is_empty() {
        parent.to_owned()
    } else {
        format!("{parent}/{name}")
    }
}

/// Whether `path` is `base` itself or lies beneath it.
///
/// Comparison is segment-wise: `dir` contains `dir/sub` but not `directory`.
pub fn is_subpath(base: &str, path: &str) -> bool {
    relative_to(base, path).is_some()
}

/// Whether `path` lies strictly beneath `ancestor`.
pub fn is_strict_ancestor(ancestor: &str, path: &str) -> bool {
    ancestor != path && is_subpath(ancestor, path)
}

/// Strip `base` from `path`, returning the remainder relative to `base`.
///
/// Returns `None` when `path` is not `base` or one of its descendants.
pub fn relative_to<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    if base.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

/// Lexically resolve a symlink `target` stored at `link_path`.
///
/// The target is interpreted relative to the directory holding the link.
/// Returns `None` when the target is absolute or climbs above the root,
/// i.e. when it points outside the tree the link belongs to.
pub fn resolve_link_target(link_path: &str, target: &str) -> Option<String> {
    if target.starts_with('/') {
        return None;
    }
    let mut resolved: Vec<&str> = segments(link_path).collect();
    resolved.pop();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                resolved.pop()?;
            }
            s => resolved.push(s),
        }
    }
    Some(resolved.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_to_handles_root_and_prefixes() {
        assert_eq!(relative_to("", "a/b"), Some("a/b"));
        assert_eq!(relative_to("a", "a"), Some(""));
        assert_eq!(relative_to("a", "a/b"), Some("b"));
        assert_eq!(relative_to("a", "ab"), None);
        assert_eq!(relative_to("a/b", "a"), None);
    }

    #[test]
    fn strict_ancestor_excludes_self() {
        assert!(is_strict_ancestor("", "dir"));
        assert!(is_strict_ancestor("dir", "dir/sub"));
        assert!(!is_strict_ancestor("dir", "dir"));
        assert!(!is_strict_ancestor("di", "dir"));
    }

    #[test]
    fn link_targets_resolve_relative_to_parent() {
        assert_eq!(resolve_link_target("a/link", "b").as_deref(), Some("a/b"));
        assert_eq!(resolve_link_target("a/link", "../b").as_deref(), Some("b"));
        assert_eq!(resolve_link_target("link", "../b"), None);
        assert_eq!(resolve_link_target("a/link", "/etc/passwd"), None);
    }

    #[test]
    fn join_skips_empty_parts() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", ""), "a");
        assert_eq!(join("a", "b"), "a/b");
    }
}
