use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    // ── Config validation ──
    #[error("duplicate image name '{name}' in werf.toml")]
    DuplicateImage { name: String },

    #[error("image '{image}' has an invalid git mapping: {reason}")]
    InvalidGitMapping { image: String, reason: String },
}
