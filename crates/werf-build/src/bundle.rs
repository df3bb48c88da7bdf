use std::path::{Path, PathBuf};

use werf_core::path;
use werf_git::{
    EntryMode, GitError, GitRepository, LsTreeResult, ObjectId, SubmoduleHandle, TreeEntry,
};

/// What [`create_bundle`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BundleSummary {
    pub files: usize,
    pub symlinks: usize,
}

/// Materializes a walk result into `dest` as a plain directory tree.
///
/// Every selected file is written from the object store with its git mode,
/// symlinks are recreated with their recorded targets, and submodule
/// content is read from the submodule repository. Directories and
/// submodules taken whole are expanded. Any previous content of `dest` is
/// removed first.
pub fn create_bundle<R>(
    repo: &R,
    result: &LsTreeResult,
    dest: &Path,
) -> Result<BundleSummary, BundleError>
where
    R: GitRepository + ?Sized,
{
    if dest.exists() {
        std::fs::remove_dir_all(dest).map_err(|e| BundleError::Cleanup {
            path: dest.to_path_buf(),
            source: e,
        })?;
    }
    create_dir(dest)?;

    let writer = BundleWriter { dest };
    let mut summary = BundleSummary::default();
    writer.write_result(repo, "", result, &mut summary)?;

    tracing::info!(
        dest = %dest.display(),
        files = summary.files,
        symlinks = summary.symlinks,
        "bundle created"
    );
    Ok(summary)
}

struct BundleWriter<'a> {
    dest: &'a Path,
}

impl BundleWriter<'_> {
    /// `root` is the path of `repo` inside the top-level repository.
    fn write_result<R>(
        &self,
        repo: &R,
        root: &str,
        result: &LsTreeResult,
        summary: &mut BundleSummary,
    ) -> Result<(), BundleError>
    where
        R: GitRepository + ?Sized,
    {
        for entry in &result.entries {
            self.write_entry(repo, root, entry, summary)?;
        }

        for submodule in &result.submodule_results {
            let full = path::join(root, &submodule.relative_path);
            match repo.open_submodule(&submodule.relative_path)? {
                SubmoduleHandle::Initialized(handle) => {
                    self.write_result(handle.repository.as_ref(), &full, &submodule.result, summary)?;
                }
                SubmoduleHandle::NotInitialized => {
                    return Err(BundleError::SubmoduleNotInitialized { path: full });
                }
            }
        }

        for missing in &result.not_initialized_submodule_paths {
            tracing::warn!(path = %missing, "submodule is not initialized, its content is not bundled");
        }
        Ok(())
    }

    fn write_entry<R>(
        &self,
        repo: &R,
        root: &str,
        entry: &TreeEntry,
        summary: &mut BundleSummary,
    ) -> Result<(), BundleError>
    where
        R: GitRepository + ?Sized,
    {
        match entry.mode {
            EntryMode::File | EntryMode::Executable => {
                let content = repo.read_blob(&entry.id)?;
                self.write_file(&entry.path, &content, entry.mode == EntryMode::Executable)?;
                summary.files += 1;
            }
            EntryMode::Symlink => {
                let target = repo.read_blob(&entry.id)?;
                self.write_symlink(&entry.path, &String::from_utf8_lossy(&target))?;
                summary.symlinks += 1;
            }
            EntryMode::Dir => {
                create_dir(&self.dest.join(&entry.path))?;
                self.write_tree(repo, root, &entry.id, &entry.path, summary)?;
            }
            EntryMode::Submodule => {
                let local = path::relative_to(root, &entry.path).unwrap_or(&entry.path);
                let SubmoduleHandle::Initialized(handle) = repo.open_submodule(local)? else {
                    return Err(BundleError::SubmoduleNotInitialized {
                        path: entry.path.clone(),
                    });
                };
                let tree = handle.repository.commit_tree(entry.id.as_str())?;
                create_dir(&self.dest.join(&entry.path))?;
                self.write_tree(
                    handle.repository.as_ref(),
                    &entry.path,
                    &tree,
                    &entry.path,
                    summary,
                )?;
            }
        }
        Ok(())
    }

    fn write_tree<R>(
        &self,
        repo: &R,
        root: &str,
        tree: &ObjectId,
        dir: &str,
        summary: &mut BundleSummary,
    ) -> Result<(), BundleError>
    where
        R: GitRepository + ?Sized,
    {
        for item in repo.tree_entries(tree)? {
            let entry = TreeEntry {
                path: path::join(dir, &item.name),
                mode: item.mode,
                id: item.id,
            };
            self.write_entry(repo, root, &entry, summary)?;
        }
        Ok(())
    }

    fn write_file(&self, path: &str, content: &[u8], executable: bool) -> Result<(), BundleError> {
        let file = self.dest.join(path);
        if let Some(parent) = file.parent() {
            create_dir(parent)?;
        }
        std::fs::write(&file, content).map_err(|e| BundleError::WriteFile {
            path: file.clone(),
            source: e,
        })?;
        if executable {
            set_executable(&file)?;
        }
        Ok(())
    }

    fn write_symlink(&self, path: &str, target: &str) -> Result<(), BundleError> {
        if path::resolve_link_target(path, target).is_none() {
            return Err(BundleError::SymlinkEscapesScope {
                path: path.to_owned(),
                target: target.to_owned(),
            });
        }
        let link = self.dest.join(path);
        if let Some(parent) = link.parent() {
            create_dir(parent)?;
        }
        make_symlink(target, &link)
    }
}

fn create_dir(dir: &Path) -> Result<(), BundleError> {
    std::fs::create_dir_all(dir).map_err(|e| BundleError::Create {
        path: dir.to_path_buf(),
        source: e,
    })
}

#[cfg(unix)]
fn set_executable(file: &Path) -> Result<(), BundleError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(file, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
        BundleError::WriteFile {
            path: file.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
fn set_executable(_file: &Path) -> Result<(), BundleError> {
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &str, link: &Path) -> Result<(), BundleError> {
    std::os::unix::fs::symlink(target, link).map_err(|e| BundleError::WriteFile {
        path: link.to_path_buf(),
        source: e,
    })
}

// Without symlink support the target is kept as file content, as git does.
#[cfg(not(unix))]
fn make_symlink(target: &str, link: &Path) -> Result<(), BundleError> {
    std::fs::write(link, target).map_err(|e| BundleError::WriteFile {
        path: link.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("failed to clean up bundle directory {path}")]
    Cleanup { path: PathBuf, source: std::io::Error },
    #[error("failed to create directory {path}")]
    Create { path: PathBuf, source: std::io::Error },
    #[error("failed to write {path}")]
    WriteFile { path: PathBuf, source: std::io::Error },
    #[error("symlink {path} points outside the bundle (target: {target})")]
    SymlinkEscapesScope { path: String, target: String },
    #[error("submodule {path} is not initialized")]
    SubmoduleNotInitialized { path: String },
    #[error(transparent)]
    Git(#[from] GitError),
}
