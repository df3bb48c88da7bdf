use std::path::Path;

use werf_git::LsTreeOptions;

use super::MatcherArgs;

pub async fn bundle(out: &Path, commit: &str, matcher_args: &MatcherArgs) -> anyhow::Result<()> {
    let repo = super::open_repository()?;
    let matcher = matcher_args.build(&repo, commit)?;
    let options = LsTreeOptions {
        all_files: true,
        trace: matcher_args.trace_options()?,
        ..Default::default()
    };

    let result = werf_git::ls_tree(&repo, commit, &matcher, &options)?;
    if result.is_empty() {
        anyhow::bail!("matcher {matcher} selects nothing from {commit}");
    }

    let summary = werf_build::create_bundle(&repo, &result, out)?;

    println!(
        "Bundled {} files and {} symlinks into {}",
        summary.files,
        summary.symlinks,
        out.display()
    );
    println!("checksum: {}", result.checksum());
    Ok(())
}
