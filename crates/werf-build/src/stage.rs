//! Stage digests: the cache key contribution of an image's git sources.
//!
//! Each `[[image.git]]` mapping becomes one matcher; the mapping's walk
//! checksum is folded together with the matcher id, so changing either the
//! selected content or the selection rules yields a new digest.

use sha2::{Digest, Sha256};
use werf_core::{GitMapping, ImageConfig, TraceOptions, path};
use werf_git::{
    EntryMode, GitError, GitRepository, LsTreeOptions, ObjectId, StatusOptions, ls_tree, status,
};
use werf_matcher::{MatcherConfig, MatcherError, PathMatcher};

#[derive(Debug, Clone, Copy, Default)]
pub struct StageOptions {
    /// Fold uncommitted worktree changes into the digest.
    pub dev: bool,
    pub trace: TraceOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDigest {
    pub add: String,
    pub matcher_id: String,
    pub checksum: String,
    /// Worktree status checksum, only computed in dev mode.
    pub status_checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDigest {
    pub image: String,
    /// Hex sha256 over all mappings, empty for an image without git sources.
    pub digest: String,
    pub mappings: Vec<MappingDigest>,
}

/// Build the matcher for one git mapping.
///
/// The mapping's ignore file, if any, is read from `tree`; a missing file
/// contributes no patterns.
pub fn mapping_matcher<R>(
    repo: &R,
    tree: &ObjectId,
    image: &str,
    mapping: &GitMapping,
) -> Result<PathMatcher, StageError>
where
    R: GitRepository + ?Sized,
{
    let base_path = mapping
        .base_path()
        .map_err(|e| StageError::InvalidMapping {
            image: image.to_owned(),
            source: e,
        })?;

    let ignore_patterns = match &mapping.ignore_file {
        Some(file) => read_ignore_file(repo, tree, image, file)?,
        None => Vec::new(),
    };

    PathMatcher::new(MatcherConfig {
        base_path,
        include_globs: mapping.include_paths.clone(),
        exclude_globs: mapping.exclude_paths.clone(),
        ignore_patterns,
        matchers: Vec::new(),
    })
    .map_err(|e| StageError::Matcher {
        image: image.to_owned(),
        source: e,
    })
}

fn read_ignore_file<R>(
    repo: &R,
    tree: &ObjectId,
    image: &str,
    file: &str,
) -> Result<Vec<String>, StageError>
where
    R: GitRepository + ?Sized,
{
    let file = path::normalize(file).map_err(|e| StageError::InvalidMapping {
        image: image.to_owned(),
        source: e,
    })?;
    let entry = match repo.find_entry(tree, &file)? {
        Some(entry) if matches!(entry.mode, EntryMode::File | EntryMode::Executable) => entry,
        Some(_) | None => {
            tracing::warn!(image, file, "ignore file not found in commit, no patterns applied");
            return Ok(Vec::new());
        }
    };
    let content = String::from_utf8(repo.read_blob(&entry.id)?).map_err(|e| {
        StageError::IgnoreFileEncoding {
            path: file.clone(),
            source: e,
        }
    })?;
    Ok(content.lines().map(str::to_owned).collect())
}

/// Compute the git-source digest of `image` at `commit`.
pub fn image_digest<R>(
    repo: &R,
    commit: &str,
    image: &ImageConfig,
    options: &StageOptions,
) -> Result<ImageDigest, StageError>
where
    R: GitRepository + ?Sized,
{
    let tree = repo.commit_tree(commit)?;
    let ls_tree_options = LsTreeOptions {
        trace: options.trace,
        ..Default::default()
    };
    let status_options = StatusOptions {
        trace: options.trace,
    };

    let mut mappings = Vec::with_capacity(image.git.len());
    for mapping in &image.git {
        let matcher = mapping_matcher(repo, &tree, &image.name, mapping)?;
        let checksum = ls_tree(repo, commit, &matcher, &ls_tree_options)?.checksum();
        let status_checksum = if options.dev {
            Some(status(repo, &matcher, &status_options)?.checksum())
        } else {
            None
        };

        tracing::debug!(
            image = %image.name,
            add = %mapping.add,
            %matcher,
            checksum,
            "mapping digest"
        );
        mappings.push(MappingDigest {
            add: mapping.add.clone(),
            matcher_id: matcher.id(),
            checksum,
            status_checksum,
        });
    }

    let digest = if mappings.is_empty() {
        String::new()
    } else {
        let mut hasher = Sha256::new();
        for mapping in &mappings {
            hasher.update(mapping.matcher_id.as_bytes());
            hasher.update([0u8]);
            hasher.update(mapping.checksum.as_bytes());
            hasher.update([0u8]);
            hasher.update(mapping.status_checksum.as_deref().unwrap_or("").as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    };

    tracing::info!(image = %image.name, digest, "computed image digest");
    Ok(ImageDigest {
        image: image.name.clone(),
        digest,
        mappings,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("image '{image}' has an invalid git mapping")]
    InvalidMapping {
        image: String,
        source: werf_core::Error,
    },
    #[error("image '{image}' has an invalid path filter")]
    Matcher {
        image: String,
        source: MatcherError,
    },
    #[error("ignore file {path} is not valid UTF-8")]
    IgnoreFileEncoding {
        path: String,
        source: std::string::FromUtf8Error,
    },
    #[error(transparent)]
    Git(#[from] GitError),
}
