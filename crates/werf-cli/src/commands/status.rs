use werf_git::{FileState, StatusEntry, StatusOptions, StatusResult};

use super::MatcherArgs;

pub async fn status(matcher_args: &MatcherArgs) -> anyhow::Result<()> {
    let repo = super::open_repository()?;
    let matcher = matcher_args.build(&repo, "HEAD")?;
    let options = StatusOptions {
        trace: matcher_args.trace_options()?,
    };

    let result = werf_git::status(&repo, &matcher, &options)?;
    if result.is_empty() {
        println!("No selected changes");
        return Ok(());
    }

    print_result(&result);
    println!();
    println!("checksum: {}", result.checksum());
    Ok(())
}

fn print_result(result: &StatusResult) {
    for entry in &result.entries {
        print_entry(entry);
    }
    for path in &result.not_initialized_submodule_paths {
        println!("  submodule {path} (not initialized)");
    }
    for submodule in &result.submodule_results {
        let commit = submodule
            .current_commit
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string);
        println!("  submodule {} at {commit}", submodule.relative_path);
        print_result(&submodule.result);
    }
}

fn print_entry(entry: &StatusEntry) {
    match &entry.state {
        FileState::Present { mode, content_hash } => {
            println!("  {mode} {content_hash}  {}", entry.path);
        }
        FileState::Deleted => println!("  deleted  {}", entry.path),
    }
}
