use werf_git::LsTreeOptions;

use super::MatcherArgs;

pub async fn ls_tree(
    commit: &str,
    all_files: bool,
    scope: Option<String>,
    matcher_args: &MatcherArgs,
) -> anyhow::Result<()> {
    let repo = super::open_repository()?;
    let matcher = matcher_args.build(&repo, commit)?;
    let options = LsTreeOptions {
        all_files,
        path_scope: scope.unwrap_or_default(),
        trace: matcher_args.trace_options()?,
    };

    let result = werf_git::ls_tree(&repo, commit, &matcher, &options)?;

    for entry in result.all_entries() {
        println!("{} {}\t{}", entry.mode, entry.id, entry.path);
    }
    for path in &result.not_initialized_submodule_paths {
        println!("160000 (not initialized)\t{path}");
    }
    Ok(())
}
