//! Worktree status scans.
//!
//! Uncommitted changes are filtered with the same matchers as commit
//! walks and hashed from worktree content, so a dev build can fold local
//! edits into its digest.

use std::fs::Metadata;
use std::path::Path;

use werf_core::{TraceOptions, path};
use werf_matcher::PathMatcher;

use crate::GitError;
use crate::checksum::{self, Checksum, content_hash};
use crate::repository::{ChangeKind, EntryMode, GitRepository, ObjectId, SubmoduleHandle};

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOptions {
    pub trace: TraceOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Present {
        mode: EntryMode,
        /// Hex sha256 of the file content, or of the target for symlinks.
        content_hash: String,
    },
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub state: FileState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusResult {
    pub entries: Vec<StatusEntry>,
    pub submodule_results: Vec<SubmoduleStatusResult>,
    pub not_initialized_submodule_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleStatusResult {
    pub name: String,
    pub relative_path: String,
    pub current_commit: Option<ObjectId>,
    pub result: StatusResult,
}

/// Collect the worktree changes of `repo` that `matcher` selects.
///
/// Changed submodules are scanned recursively. Entry paths are relative to
/// the root of `repo`.
pub fn status<R>(
    repo: &R,
    matcher: &PathMatcher,
    options: &StatusOptions,
) -> Result<StatusResult, GitError>
where
    R: GitRepository + ?Sized,
{
    let scanner = Scanner { matcher, options };
    let result = scanner.scan(repo, "")?;
    tracing::debug!(
        entries = result.entries.len(),
        submodules = result.submodule_results.len(),
        "scanned worktree status"
    );
    Ok(result)
}

struct Scanner<'a> {
    matcher: &'a PathMatcher,
    options: &'a StatusOptions,
}

impl Scanner<'_> {
    fn scan<R>(&self, repo: &R, root: &str) -> Result<StatusResult, GitError>
    where
        R: GitRepository + ?Sized,
    {
        let workdir = repo.workdir().ok_or(GitError::NoWorktree)?;
        let mut result = StatusResult::default();

        for change in repo.worktree_status()? {
            let local = change.path.trim_end_matches('/');
            let full = path::join(root, local);

            if change.is_submodule {
                if self.matcher.is_dir_or_submodule_path_matched(&full) {
                    self.submodule(repo, root, local, &mut result)?;
                } else {
                    self.trace(&full, "skip submodule");
                }
                continue;
            }

            if let ChangeKind::Renamed { from } = &change.kind {
                let from = path::join(root, from);
                if self.matcher.is_leaf_matched(&from) {
                    self.trace(&from, "renamed away");
                    result.entries.push(StatusEntry {
                        path: from,
                        state: FileState::Deleted,
                    });
                }
            }

            if !self.matcher.is_leaf_matched(&full) {
                self.trace(&full, "skip");
                continue;
            }

            let state = match change.kind {
                ChangeKind::Deleted => FileState::Deleted,
                _ => match read_worktree_file(&workdir.join(local), &full)? {
                    Some(state) => state,
                    None => {
                        self.trace(&full, "skip directory");
                        continue;
                    }
                },
            };
            self.trace(&full, "match");
            result.entries.push(StatusEntry { path: full, state });
        }

        Ok(result)
    }

    fn submodule<R>(
        &self,
        repo: &R,
        root: &str,
        local: &str,
        result: &mut StatusResult,
    ) -> Result<(), GitError>
    where
        R: GitRepository + ?Sized,
    {
        let full = path::join(root, local);
        match repo.open_submodule(local)? {
            SubmoduleHandle::NotInitialized => {
                self.trace(&full, "submodule not initialized");
                result.not_initialized_submodule_paths.push(full);
            }
            SubmoduleHandle::Initialized(submodule) => {
                self.trace(&full, "scan submodule");
                let submodule_result = self.scan(submodule.repository.as_ref(), &full)?;
                result.submodule_results.push(SubmoduleStatusResult {
                    name: submodule.name,
                    relative_path: local.to_owned(),
                    current_commit: submodule.current_commit,
                    result: submodule_result,
                });
            }
        }
        Ok(())
    }

    fn trace(&self, path: &str, decision: &str) {
        if self.options.trace.enabled {
            tracing::debug!(path, decision, "status");
        }
    }
}

/// Hash a changed worktree file. Directories yield `None`.
fn read_worktree_file(file: &Path, path: &str) -> Result<Option<FileState>, GitError> {
    let io_error = |e| GitError::Io {
        path: file.to_path_buf(),
        source: e,
    };
    let metadata = match std::fs::symlink_metadata(file) {
        Ok(metadata) => metadata,
        // Removed after the status listing was taken.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path, "changed file is gone from the worktree");
            return Ok(Some(FileState::Deleted));
        }
        Err(e) => return Err(io_error(e)),
    };

    if metadata.file_type().is_symlink() {
        let target = std::fs::read_link(file).map_err(io_error)?;
        let target = target.to_string_lossy();
        if path::resolve_link_target(path, &target).is_none() {
            return Err(GitError::SymlinkEscapesScope {
                path: path.to_owned(),
                target: target.into_owned(),
            });
        }
        return Ok(Some(FileState::Present {
            mode: EntryMode::Symlink,
            content_hash: content_hash(target.as_bytes()),
        }));
    }
    if metadata.is_dir() {
        return Ok(None);
    }

    let content = std::fs::read(file).map_err(io_error)?;
    let mode = if is_executable(&metadata) {
        EntryMode::Executable
    } else {
        EntryMode::File
    };
    Ok(Some(FileState::Present {
        mode,
        content_hash: content_hash(&content),
    }))
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &Metadata) -> bool {
    false
}

impl StatusResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.submodule_results.is_empty()
            && self.not_initialized_submodule_paths.is_empty()
    }

    /// Deterministic hex digest of the selected changes, empty when none.
    pub fn checksum(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut checksum = Checksum::new();

        let mut entries: Vec<&StatusEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        let zero = ObjectId::zero();
        for entry in entries {
            match &entry.state {
                FileState::Present { mode, content_hash } => {
                    checksum.record("file", &[&entry.path, mode.as_octal(), content_hash]);
                }
                FileState::Deleted => checksum.record("deleted", &[&entry.path, zero.as_str()]),
            }
        }

        let mut not_initialized: Vec<&String> = self.not_initialized_submodule_paths.iter().collect();
        not_initialized.sort();
        for path in not_initialized {
            checksum.record(
                "not-initialized",
                &[path, &checksum::not_initialized_sentinel(path)],
            );
        }

        let mut submodules: Vec<&SubmoduleStatusResult> = self.submodule_results.iter().collect();
        submodules.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        for submodule in submodules {
            let commit = submodule
                .current_commit
                .as_ref()
                .map_or("", ObjectId::as_str);
            checksum.record(
                "submodule",
                &[&submodule.relative_path, commit, &submodule.result.checksum()],
            );
        }

        checksum.finish()
    }
}
