#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("invalid glob pattern {pattern:?}: {reason}")]
    InvalidGlobPattern {
        pattern: String,
        reason: &'static str,
    },

    #[error("invalid ignore pattern {pattern:?} on line {line}: {reason}")]
    InvalidIgnorePattern {
        pattern: String,
        line: usize,
        reason: &'static str,
    },

    #[error("invalid base path")]
    InvalidBasePath(#[from] werf_core::Error),
}

impl MatcherError {
    pub(crate) fn glob(pattern: &str, reason: &'static str) -> Self {
        Self::InvalidGlobPattern {
            pattern: pattern.to_owned(),
            reason,
        }
    }
}
