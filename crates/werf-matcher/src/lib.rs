//! Path matchers deciding which repository paths feed a build stage.
//!
//! # Matcher kinds
//!
//! | Matcher            | Selects                                              |
//! |--------------------|------------------------------------------------------|
//! | `True` / `False`   | everything / nothing                                 |
//! | [`IncludeMatcher`] | paths matching any include glob                      |
//! | [`ExcludeMatcher`] | everything except paths matching an exclude glob     |
//! | [`IgnoreFileMatcher`] | everything a `.dockerignore` pattern list keeps   |
//! | [`BasePathMatcher`] | paths under a base path, filtered by an inner matcher |
//! | [`MultiMatcher`]   | paths every member selects                           |
//!
//! [`PathMatcher::new`] assembles these from a [`MatcherConfig`].
//!
//! # Walking with a matcher
//!
//! ```text
//! is_path_matched(p)    → take p with its whole subtree, do not enumerate
//! should_go_through(p)  → descend into p, ask again per child
//! otherwise             → skip p and everything below it
//! ```
//!
//! Glob decisions for `should_go_through` are made one path segment at a
//! time, so excluded subtrees are pruned without being listed.

mod base_path;
mod error;
mod exclude;
mod factory;
pub mod glob;
mod ignore_file;
mod include;
mod matcher;
mod multi;

pub use base_path::BasePathMatcher;
pub use error::MatcherError;
pub use exclude::ExcludeMatcher;
pub use factory::MatcherConfig;
pub use glob::Glob;
pub use ignore_file::{IgnoreFileMatcher, IgnorePattern};
pub use include::IncludeMatcher;
pub use matcher::PathMatcher;
pub use multi::MultiMatcher;
