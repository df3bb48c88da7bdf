use std::path::Path;

use tokio::task::JoinSet;
use werf_build::{ImageDigest, StageOptions};
use werf_core::{ImageConfig, WerfConfig};
use werf_git::Git2Repository;

pub async fn stages(
    commit: &str,
    dev: bool,
    image: Option<&str>,
    json: bool,
    trace: bool,
) -> anyhow::Result<()> {
    let config = WerfConfig::load(Path::new("."))?;
    let images: Vec<ImageConfig> = match image {
        Some(name) => match config.image(name) {
            Some(image) => vec![image.clone()],
            None => anyhow::bail!("image '{name}' is not defined in werf.toml"),
        },
        None => config.images.clone(),
    };
    if images.is_empty() {
        anyhow::bail!("no images defined in werf.toml");
    }

    let options = StageOptions {
        dev,
        trace: super::trace_options(trace)?,
    };

    // libgit2 handles are not shareable across threads; each task opens its own.
    let mut tasks = JoinSet::new();
    for (index, image) in images.into_iter().enumerate() {
        let commit = commit.to_owned();
        tasks.spawn_blocking(move || -> anyhow::Result<(usize, ImageDigest)> {
            let repo = Git2Repository::discover(".")?;
            let digest = werf_build::image_digest(&repo, &commit, &image, &options)?;
            Ok((index, digest))
        });
    }

    let mut digests = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        digests.push(joined??);
    }
    digests.sort_by_key(|(index, _)| *index);

    if json {
        let output: Vec<serde_json::Value> = digests
            .iter()
            .map(|(_, digest)| digest_json(digest))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (_, digest) in &digests {
            let shown = if digest.digest.is_empty() {
                "-"
            } else {
                digest.digest.as_str()
            };
            println!("{}\t{shown}", digest.image);
        }
    }
    Ok(())
}

fn digest_json(digest: &ImageDigest) -> serde_json::Value {
    let mappings: Vec<serde_json::Value> = digest
        .mappings
        .iter()
        .map(|mapping| {
            serde_json::json!({
                "add": mapping.add,
                "matcher_id": mapping.matcher_id,
                "checksum": mapping.checksum,
                "status_checksum": mapping.status_checksum,
            })
        })
        .collect();
    serde_json::json!({
        "image": digest.image,
        "digest": digest.digest,
        "mappings": mappings,
    })
}
