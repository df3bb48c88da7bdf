//! Git access for werf: matcher-guided tree walks, worktree status scans,
//! and the checksums built from them.
//!
//! All object reads go through the [`GitRepository`] trait so walks can be
//! tested against mocks; [`Git2Repository`] is the libgit2 implementation.

mod checksum;
pub mod error;
pub mod git2_repo;
pub mod ls_tree;
pub mod repository;
pub mod status;

pub use checksum::content_hash;
pub use error::GitError;
pub use git2_repo::Git2Repository;
pub use ls_tree::{LsTreeOptions, LsTreeResult, SubmoduleResult, ls_tree};
pub use repository::{
    ChangeKind, EntryMode, GitRepository, ObjectId, Submodule, SubmoduleHandle, TreeEntry,
    TreeItem, WorktreeChange,
};
pub use status::{
    FileState, StatusEntry, StatusOptions, StatusResult, SubmoduleStatusResult, status,
};
