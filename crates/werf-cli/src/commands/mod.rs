mod bundle;
mod checksum;
mod ls_tree;
mod stages;
mod status;

use std::path::Path;

use clap::Args;
use werf_core::{GitMapping, TraceOptions, WerfConfig};
use werf_git::{Git2Repository, GitRepository};
use werf_matcher::PathMatcher;

pub use bundle::bundle;
pub use checksum::checksum;
pub use ls_tree::ls_tree;
pub use stages::stages;
pub use status::status;

/// Path filters shared by every command that walks the repository.
#[derive(Args, Debug)]
pub struct MatcherArgs {
    /// Only select paths under this directory
    #[arg(long, default_value = "/", value_name = "PATH")]
    pub base_path: String,
    /// Select paths matching this glob, relative to the base path (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub include: Vec<String>,
    /// Drop paths matching this glob, relative to the base path (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,
    /// Ignore file in dockerignore syntax, read from the commit
    #[arg(long, value_name = "PATH")]
    pub ignore_file: Option<String>,
    /// Log every walk decision
    #[arg(long)]
    pub trace: bool,
}

impl MatcherArgs {
    /// Build the matcher, reading the ignore file from `commit`.
    pub(crate) fn build<R>(&self, repo: &R, commit: &str) -> anyhow::Result<PathMatcher>
    where
        R: GitRepository + ?Sized,
    {
        let tree = repo.commit_tree(commit)?;
        let mapping = GitMapping {
            add: self.base_path.clone(),
            include_paths: self.include.clone(),
            exclude_paths: self.exclude.clone(),
            ignore_file: self.ignore_file.clone(),
        };
        let matcher = werf_build::mapping_matcher(repo, &tree, "command line", &mapping)?;
        tracing::debug!(%matcher, id = matcher.id(), "built matcher");
        Ok(matcher)
    }

    pub(crate) fn trace_options(&self) -> anyhow::Result<TraceOptions> {
        trace_options(self.trace)
    }
}

/// `--trace` wins; otherwise `[trace]` from werf.toml applies.
pub(crate) fn trace_options(flag: bool) -> anyhow::Result<TraceOptions> {
    let config = WerfConfig::load(Path::new("."))?;
    let mut options = TraceOptions::from(&config.trace);
    options.enabled |= flag;
    Ok(options)
}

pub(crate) fn open_repository() -> anyhow::Result<Git2Repository> {
    Ok(Git2Repository::discover(".")?)
}
