use std::collections::HashSet;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, Oid, Repository, Status, StatusOptions, SubmoduleIgnore, SubmoduleStatus};

use crate::repository::{
    ChangeKind, EntryMode, GitRepository, ObjectId, Submodule, SubmoduleHandle, TreeItem,
    WorktreeChange,
};
use crate::GitError;

/// [`GitRepository`] backed by libgit2.
pub struct Git2Repository {
    repo: Repository,
}

impl Git2Repository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| GitError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { repo })
    }

    /// Open the repository containing `path`, searching parent directories.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|e| GitError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { repo })
    }

    fn oid(id: &ObjectId) -> Result<Oid, GitError> {
        Oid::from_str(id.as_str()).map_err(|e| GitError::object(id.as_str(), e))
    }
}

impl From<Repository> for Git2Repository {
    fn from(repo: Repository) -> Self {
        Self { repo }
    }
}

impl GitRepository for Git2Repository {
    fn commit_tree(&self, revision: &str) -> Result<ObjectId, GitError> {
        let not_found = |e: git2::Error| GitError::CommitNotFound {
            commit: revision.to_owned(),
            source: e,
        };
        let object = self.repo.revparse_single(revision).map_err(|e| match e.code() {
            ErrorCode::NotFound | ErrorCode::InvalidSpec | ErrorCode::Ambiguous => not_found(e),
            _ => GitError::object(revision, e),
        })?;
        let commit = object.peel_to_commit().map_err(not_found)?;
        Ok(commit.tree_id().into())
    }

    fn tree_entries(&self, tree: &ObjectId) -> Result<Vec<TreeItem>, GitError> {
        let tree_object = self
            .repo
            .find_tree(Self::oid(tree)?)
            .map_err(|e| GitError::object(tree.as_str(), e))?;

        tree_object
            .iter()
            .map(|entry| {
                let name = String::from_utf8_lossy(entry.name_bytes()).into_owned();
                let mode = EntryMode::from_filemode(entry.filemode()).ok_or_else(|| {
                    GitError::UnsupportedMode {
                        path: name.clone(),
                        mode: entry.filemode(),
                    }
                })?;
                Ok(TreeItem {
                    name,
                    mode,
                    id: entry.id().into(),
                })
            })
            .collect()
    }

    fn read_blob(&self, blob: &ObjectId) -> Result<Vec<u8>, GitError> {
        let blob_object = self
            .repo
            .find_blob(Self::oid(blob)?)
            .map_err(|e| GitError::object(blob.as_str(), e))?;
        Ok(blob_object.content().to_vec())
    }

    fn open_submodule(&self, path: &str) -> Result<SubmoduleHandle, GitError> {
        let submodule = match self.repo.find_submodule(path) {
            Ok(submodule) => submodule,
            Err(e) if e.code() == ErrorCode::NotFound => {
                tracing::warn!(path, error = %e, "submodule is missing from .gitmodules");
                return Ok(SubmoduleHandle::NotInitialized);
            }
            Err(e) => return Err(GitError::object(path, e)),
        };
        let name = submodule.name().unwrap_or(path).to_owned();

        let status = self
            .repo
            .submodule_status(&name, SubmoduleIgnore::None)
            .map_err(|e| GitError::object(path, e))?;
        if status.contains(SubmoduleStatus::WD_UNINITIALIZED)
            || !status.contains(SubmoduleStatus::IN_WD)
        {
            return Ok(SubmoduleHandle::NotInitialized);
        }

        let repository = match submodule.open() {
            Ok(repo) => repo,
            Err(e) => {
                tracing::warn!(path, error = %e, "submodule worktree cannot be opened");
                return Ok(SubmoduleHandle::NotInitialized);
            }
        };

        let is_clean = !status.intersects(
            SubmoduleStatus::WD_MODIFIED
                | SubmoduleStatus::WD_INDEX_MODIFIED
                | SubmoduleStatus::WD_WD_MODIFIED
                | SubmoduleStatus::WD_UNTRACKED,
        );

        Ok(SubmoduleHandle::Initialized(Submodule {
            name,
            repository: Box::new(Self::from(repository)),
            current_commit: submodule.workdir_id().map(ObjectId::from),
            is_clean,
        }))
    }

    fn worktree_status(&self) -> Result<Vec<WorktreeChange>, GitError> {
        if self.repo.workdir().is_none() {
            return Err(GitError::NoWorktree);
        }

        let submodule_paths: HashSet<String> = self
            .repo
            .submodules()
            .map_err(|e| GitError::object("submodules", e))?
            .iter()
            .filter_map(|s| s.path().to_str().map(str::to_owned))
            .collect();

        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .exclude_submodules(false)
            .renames_head_to_index(true)
            .renames_index_to_workdir(true);

        let statuses = self
            .repo
            .statuses(Some(&mut options))
            .map_err(|e| GitError::object("worktree status", e))?;

        let mut changes = Vec::with_capacity(statuses.len());
        for entry in statuses.iter() {
            let status = entry.status();
            if status.is_empty() || status.contains(Status::IGNORED) {
                continue;
            }
            let Some(old_path) = entry.path().map(str::to_owned) else {
                tracing::warn!("skipping status entry with a non UTF-8 path");
                continue;
            };

            let renamed = status.intersects(Status::INDEX_RENAMED | Status::WT_RENAMED);
            let (path, kind) = if renamed && status.contains(Status::WT_DELETED) {
                // Staged rename whose new file is gone: only the source changed against HEAD.
                (old_path, ChangeKind::Deleted)
            } else if renamed {
                let new_path = entry
                    .index_to_workdir()
                    .or_else(|| entry.head_to_index())
                    .and_then(|delta| delta.new_file().path().and_then(Path::to_str))
                    .map(str::to_owned)
                    .unwrap_or_else(|| old_path.clone());
                (new_path, ChangeKind::Renamed { from: old_path })
            } else if status.contains(Status::WT_DELETED)
                || (status.contains(Status::INDEX_DELETED) && !status.contains(Status::WT_NEW))
            {
                (old_path, ChangeKind::Deleted)
            } else if status.contains(Status::WT_NEW) {
                (old_path, ChangeKind::Untracked)
            } else if status.contains(Status::INDEX_NEW) {
                (old_path, ChangeKind::Added)
            } else {
                (old_path, ChangeKind::Modified)
            };

            changes.push(WorktreeChange {
                is_submodule: submodule_paths.contains(&path),
                path,
                kind,
            });
        }
        Ok(changes)
    }

    fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(Path::to_path_buf)
    }
}
