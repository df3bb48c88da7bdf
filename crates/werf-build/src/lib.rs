//! Consumers of the path-matching engine: source bundles and stage digests.
//!
//! # Stage digest pipeline
//!
//! ```text
//! werf.toml [[image.git]]
//!   1. Matcher   ── add / include_paths / exclude_paths / ignore_file → PathMatcher
//!   2. Walk      ── ls_tree(commit, matcher) → LsTreeResult
//!   3. Checksum  ── LsTreeResult::checksum (+ worktree status in dev mode)
//!   4. Digest    ── sha256 over (matcher id, checksum) per mapping
//! ```
//!
//! # Bundle strategy
//!
//! A bundle mirrors exactly what a walk selected, read from the object
//! store rather than the worktree, so it matches the digest computed for
//! the same commit and matcher.

pub mod bundle;
pub mod stage;

pub use bundle::{BundleError, BundleSummary, create_bundle};
pub use stage::{ImageDigest, MappingDigest, StageError, StageOptions, image_digest, mapping_matcher};
