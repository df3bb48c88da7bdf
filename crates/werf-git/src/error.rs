use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to open git repository at {path}")]
    Open {
        path: PathBuf,
        source: git2::Error,
    },

    #[error("commit '{commit}' not found")]
    CommitNotFound {
        commit: String,
        source: git2::Error,
    },

    #[error("failed to read git object {object}")]
    ObjectRead {
        object: String,
        source: git2::Error,
    },

    #[error("unsupported git file mode {mode:o} for {path}")]
    UnsupportedMode { path: String, mode: i32 },

    #[error("symlink {path} points outside the repository (target: {target})")]
    SymlinkEscapesScope { path: String, target: String },

    #[error(transparent)]
    InvalidPath(#[from] werf_core::Error),

    #[error("repository has no working tree")]
    NoWorktree,

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl GitError {
    pub(crate) fn object(object: impl Into<String>, source: git2::Error) -> Self {
        Self::ObjectRead {
            object: object.into(),
            source,
        }
    }
}
