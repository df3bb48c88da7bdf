use werf_git::LsTreeOptions;

use super::MatcherArgs;

pub async fn checksum(commit: &str, matcher_args: &MatcherArgs) -> anyhow::Result<()> {
    let repo = super::open_repository()?;
    let matcher = matcher_args.build(&repo, commit)?;
    let options = LsTreeOptions {
        trace: matcher_args.trace_options()?,
        ..Default::default()
    };

    let result = werf_git::ls_tree(&repo, commit, &matcher, &options)?;
    if result.is_empty() {
        tracing::warn!(commit, %matcher, "matcher selects nothing");
    }

    println!("{}", result.checksum());
    Ok(())
}
