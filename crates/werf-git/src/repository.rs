use std::fmt;
use std::path::PathBuf;

use crate::GitError;

/// Hex id of a git object (commit, tree, or blob).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The all-zero id git uses for "no object".
    pub fn zero() -> Self {
        Self("0".repeat(40))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<git2::Oid> for ObjectId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

/// Git tree entry modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryMode {
    File,
    Executable,
    Dir,
    Symlink,
    Submodule,
}

impl EntryMode {
    /// Map a raw git filemode. Returns `None` for modes git never writes.
    pub fn from_filemode(mode: i32) -> Option<Self> {
        match mode {
            // 100664 appears in very old repositories.
            0o100644 | 0o100664 => Some(Self::File),
            0o100755 => Some(Self::Executable),
            0o040000 => Some(Self::Dir),
            0o120000 => Some(Self::Symlink),
            0o160000 => Some(Self::Submodule),
            _ => None,
        }
    }

    pub fn as_octal(self) -> &'static str {
        match self {
            Self::File => "100644",
            Self::Executable => "100755",
            Self::Dir => "040000",
            Self::Symlink => "120000",
            Self::Submodule => "160000",
        }
    }

    pub fn is_tree_like(self) -> bool {
        matches!(self, Self::Dir | Self::Submodule)
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_octal())
    }
}

/// One entry of a single tree object, as stored by git.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub name: String,
    pub mode: EntryMode,
    pub id: ObjectId,
}

/// An entry selected by a walk, addressed by its path from the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub mode: EntryMode,
    pub id: ObjectId,
}

/// How a worktree path differs from `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Untracked,
    Deleted,
    Renamed { from: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeChange {
    pub path: String,
    pub kind: ChangeKind,
    pub is_submodule: bool,
}

pub struct Submodule {
    pub name: String,
    pub repository: Box<dyn GitRepository>,
    /// Commit checked out in the submodule worktree.
    pub current_commit: Option<ObjectId>,
    /// No local modifications and `HEAD` at the recorded commit.
    pub is_clean: bool,
}

impl fmt::Debug for Submodule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submodule")
            .field("name", &self.name)
            .field("current_commit", &self.current_commit)
            .field("is_clean", &self.is_clean)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum SubmoduleHandle {
    NotInitialized,
    Initialized(Submodule),
}

/// Read access to a git object store and its worktree.
///
/// Production code uses [`Git2Repository`](crate::Git2Repository), tests use
/// mockall-generated mocks.
pub trait GitRepository {
    /// Resolve a revision to the id of its root tree.
    fn commit_tree(&self, revision: &str) -> Result<ObjectId, GitError>;

    /// List the direct entries of a tree object.
    fn tree_entries(&self, tree: &ObjectId) -> Result<Vec<TreeItem>, GitError>;

    fn read_blob(&self, blob: &ObjectId) -> Result<Vec<u8>, GitError>;

    /// Open the submodule checked out at `path` (relative to this repository).
    fn open_submodule(&self, path: &str) -> Result<SubmoduleHandle, GitError>;

    /// Paths whose worktree state differs from `HEAD`, untracked files included.
    fn worktree_status(&self) -> Result<Vec<WorktreeChange>, GitError>;

    fn workdir(&self) -> Option<PathBuf>;

    /// Find the entry at `path` below `tree`. Lookups do not cross submodules.
    fn find_entry(&self, tree: &ObjectId, path: &str) -> Result<Option<TreeEntry>, GitError> {
        let mut current = tree.clone();
        let mut found: Option<TreeEntry> = None;
        let mut walked = String::new();

        for segment in werf_core::path::segments(path) {
            if let Some(entry) = &found {
                if entry.mode != EntryMode::Dir {
                    return Ok(None);
                }
                current = entry.id.clone();
            }
            let Some(item) = self
                .tree_entries(&current)?
                .into_iter()
                .find(|item| item.name == segment)
            else {
                return Ok(None);
            };
            walked = werf_core::path::join(&walked, segment);
            found = Some(TreeEntry {
                path: walked.clone(),
                mode: item.mode,
                id: item.id,
            });
        }
        Ok(found)
    }
}
