//! Matcher-guided walks over commit trees.
//!
//! For every tree entry the walker asks the matcher once: a fully matched
//! entry is taken whole (directories and submodules included, without being
//! read), an entry to go through is opened and its children asked in turn,
//! and anything else is skipped unread.

use werf_core::{TraceOptions, path};
use werf_matcher::PathMatcher;

use crate::GitError;
use crate::checksum::{self, Checksum};
use crate::repository::{EntryMode, GitRepository, ObjectId, SubmoduleHandle, TreeEntry};

#[derive(Debug, Clone, Default)]
pub struct LsTreeOptions {
    /// Enumerate the leaves of fully matched directories and submodules
    /// instead of taking them whole.
    pub all_files: bool,
    /// Only walk the entry at this path (the whole tree when empty).
    pub path_scope: String,
    pub trace: TraceOptions,
}

/// Entries selected from one repository, plus the submodules walked under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LsTreeResult {
    pub entries: Vec<TreeEntry>,
    pub submodule_results: Vec<SubmoduleResult>,
    /// Submodules that matched but could not be read.
    pub not_initialized_submodule_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleResult {
    pub name: String,
    /// Path of the submodule inside its parent repository.
    pub relative_path: String,
    pub is_not_clean: bool,
    pub current_commit: Option<ObjectId>,
    pub result: LsTreeResult,
}

/// Walk the tree of `commit`, keeping what `matcher` selects.
///
/// Entry paths in the result, submodule contents included, are relative to
/// the root of `repo`. A `path_scope` that does not exist yields an empty
/// result.
pub fn ls_tree<R>(
    repo: &R,
    commit: &str,
    matcher: &PathMatcher,
    options: &LsTreeOptions,
) -> Result<LsTreeResult, GitError>
where
    R: GitRepository + ?Sized,
{
    let tree = repo.commit_tree(commit)?;
    let scope = path::normalize(&options.path_scope)?;
    let walker = Walker { matcher, options };
    let mut result = LsTreeResult::default();

    if scope.is_empty() {
        walker.walk_tree(repo, "", &tree, "", &mut result)?;
    } else {
        match repo.find_entry(&tree, &scope)? {
            Some(entry) => walker.visit(repo, "", entry, &mut result)?,
            None => tracing::debug!(commit, scope, "scope not found in commit tree"),
        }
    }

    tracing::debug!(
        commit,
        entries = result.entries.len(),
        submodules = result.submodule_results.len(),
        not_initialized = result.not_initialized_submodule_paths.len(),
        "walked commit tree"
    );
    Ok(result)
}

struct Walker<'a> {
    matcher: &'a PathMatcher,
    options: &'a LsTreeOptions,
}

impl Walker<'_> {
    /// `root` is the path of `repo` inside the top-level repository and
    /// `dir` the path of `tree`; both prefix every produced entry path.
    fn walk_tree<R>(
        &self,
        repo: &R,
        root: &str,
        tree: &ObjectId,
        dir: &str,
        result: &mut LsTreeResult,
    ) -> Result<(), GitError>
    where
        R: GitRepository + ?Sized,
    {
        for item in repo.tree_entries(tree)? {
            let entry = TreeEntry {
                path: path::join(dir, &item.name),
                mode: item.mode,
                id: item.id,
            };
            self.visit(repo, root, entry, result)?;
        }
        Ok(())
    }

    fn visit<R>(
        &self,
        repo: &R,
        root: &str,
        entry: TreeEntry,
        result: &mut LsTreeResult,
    ) -> Result<(), GitError>
    where
        R: GitRepository + ?Sized,
    {
        if self.matcher.is_path_matched(&entry.path) {
            if self.options.all_files && entry.mode.is_tree_like() {
                self.trace(&entry.path, "match, enumerate");
                return self.descend(repo, root, entry, result);
            }
            self.trace(&entry.path, "match");
            result.entries.push(entry);
        } else if self.matcher.should_go_through(&entry.path) {
            if entry.mode.is_tree_like() {
                self.trace(&entry.path, "go through");
                return self.descend(repo, root, entry, result);
            }
            if self.matcher.is_leaf_matched(&entry.path) {
                self.trace(&entry.path, "match leaf");
                result.entries.push(entry);
            } else {
                self.trace(&entry.path, "skip leaf");
            }
        } else {
            self.trace(&entry.path, "skip");
        }
        Ok(())
    }

    fn descend<R>(
        &self,
        repo: &R,
        root: &str,
        entry: TreeEntry,
        result: &mut LsTreeResult,
    ) -> Result<(), GitError>
    where
        R: GitRepository + ?Sized,
    {
        match entry.mode {
            EntryMode::Submodule => self.submodule(repo, root, entry, result),
            _ => self.walk_tree(repo, root, &entry.id, &entry.path, result),
        }
    }

    fn submodule<R>(
        &self,
        repo: &R,
        root: &str,
        entry: TreeEntry,
        result: &mut LsTreeResult,
    ) -> Result<(), GitError>
    where
        R: GitRepository + ?Sized,
    {
        let relative_path = path::relative_to(root, &entry.path)
            .unwrap_or(&entry.path)
            .to_owned();

        let submodule = match repo.open_submodule(&relative_path)? {
            SubmoduleHandle::Initialized(submodule) => submodule,
            SubmoduleHandle::NotInitialized => {
                self.trace(&entry.path, "submodule not initialized");
                result.not_initialized_submodule_paths.push(entry.path);
                return Ok(());
            }
        };

        let tree = match submodule.repository.commit_tree(entry.id.as_str()) {
            Ok(tree) => tree,
            Err(GitError::CommitNotFound { source, .. }) => {
                tracing::warn!(
                    path = %entry.path,
                    commit = %entry.id,
                    error = %source,
                    "recorded submodule commit is not available locally, treating submodule as not initialized"
                );
                result.not_initialized_submodule_paths.push(entry.path);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut submodule_result = LsTreeResult::default();
        self.walk_tree(
            submodule.repository.as_ref(),
            &entry.path,
            &tree,
            &entry.path,
            &mut submodule_result,
        )?;

        result.submodule_results.push(SubmoduleResult {
            name: submodule.name,
            relative_path,
            is_not_clean: !submodule.is_clean,
            current_commit: submodule.current_commit,
            result: submodule_result,
        });
        Ok(())
    }

    fn trace(&self, path: &str, decision: &str) {
        if self.options.trace.enabled {
            tracing::debug!(path, decision, "ls-tree");
        }
    }
}

impl LsTreeResult {
    /// Nothing selected anywhere, submodules included.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.not_initialized_submodule_paths.is_empty()
            && self.submodule_results.iter().all(|s| s.result.is_empty())
    }

    /// Every selected entry, submodule contents included, ordered by path.
    pub fn all_entries(&self) -> Vec<&TreeEntry> {
        let mut entries: Vec<&TreeEntry> = self.entries.iter().collect();
        for submodule in &self.submodule_results {
            entries.extend(submodule.result.all_entries());
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    /// Deterministic hex digest of the selection.
    ///
    /// Entries, uninitialized submodules and submodule results are each
    /// hashed in path order, so the digest does not depend on walk order.
    /// Returns an empty string when nothing was selected.
    pub fn checksum(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut checksum = Checksum::new();

        let mut entries: Vec<&TreeEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        for entry in entries {
            checksum.record(
                "entry",
                &[&entry.path, entry.mode.as_octal(), entry.id.as_str()],
            );
        }

        let mut not_initialized: Vec<&String> = self.not_initialized_submodule_paths.iter().collect();
        not_initialized.sort();
        for path in not_initialized {
            checksum.record(
                "not-initialized",
                &[path, &checksum::not_initialized_sentinel(path)],
            );
        }

        let mut submodules: Vec<&SubmoduleResult> = self
            .submodule_results
            .iter()
            .filter(|s| !s.result.is_empty())
            .collect();
        submodules.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        for submodule in submodules {
            checksum.record(
                "submodule",
                &[&submodule.relative_path, &submodule.result.checksum()],
            );
            // A dirty worktree must change the digest even at the same recorded commit.
            if submodule.is_not_clean {
                let commit = submodule
                    .current_commit
                    .as_ref()
                    .map_or("", ObjectId::as_str);
                checksum.record("not-clean", &[&submodule.relative_path, commit]);
            }
        }

        checksum.finish()
    }
}
