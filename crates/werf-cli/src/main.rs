mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::MatcherArgs;

#[derive(Parser)]
#[command(name = "werf", about = "Git-aware path matching, checksums, and stage digests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries a matcher selects from a commit
    LsTree {
        /// Commit to walk
        #[arg(long, default_value = "HEAD")]
        commit: String,
        /// List individual files inside fully matched directories
        #[arg(long)]
        all_files: bool,
        /// Only walk the entry at this path
        #[arg(long, value_name = "PATH")]
        scope: Option<String>,
        #[command(flatten)]
        matcher: MatcherArgs,
    },
    /// Print the checksum of what a matcher selects from a commit
    Checksum {
        /// Commit to walk
        #[arg(long, default_value = "HEAD")]
        commit: String,
        #[command(flatten)]
        matcher: MatcherArgs,
    },
    /// Show selected uncommitted changes and their checksum
    Status {
        #[command(flatten)]
        matcher: MatcherArgs,
    },
    /// Export the files a matcher selects from a commit into a directory
    Bundle {
        /// Output directory (replaced if it exists)
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
        /// Commit to export
        #[arg(long, default_value = "HEAD")]
        commit: String,
        #[command(flatten)]
        matcher: MatcherArgs,
    },
    /// Compute git stage digests for the images in werf.toml
    Stages {
        /// Commit to digest
        #[arg(long, default_value = "HEAD")]
        commit: String,
        /// Include uncommitted worktree changes
        #[arg(long)]
        dev: bool,
        /// Only compute the digest of this image
        #[arg(long, value_name = "NAME")]
        image: Option<String>,
        /// Print digests as JSON
        #[arg(long)]
        json: bool,
        /// Log every walk decision
        #[arg(long)]
        trace: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::LsTree {
            commit,
            all_files,
            scope,
            matcher,
        } => commands::ls_tree(&commit, all_files, scope, &matcher).await?,
        Commands::Checksum { commit, matcher } => commands::checksum(&commit, &matcher).await?,
        Commands::Status { matcher } => commands::status(&matcher).await?,
        Commands::Bundle {
            out,
            commit,
            matcher,
        } => commands::bundle(&out, &commit, &matcher).await?,
        Commands::Stages {
            commit,
            dev,
            image,
            json,
            trace,
        } => commands::stages(&commit, dev, image.as_deref(), json, trace).await?,
    }

    Ok(())
}
