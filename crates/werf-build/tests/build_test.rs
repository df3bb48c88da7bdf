use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use werf_build::bundle::{BundleError, create_bundle};
use werf_build::stage::{StageOptions, image_digest};
use werf_core::{GitMapping, ImageConfig};
use werf_git::{Git2Repository, LsTreeOptions, ls_tree};
use werf_matcher::{MatcherConfig, PathMatcher};

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn write(dir: &Path, path: &str, content: &str) {
    let file = dir.join(path);
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(file, content).unwrap();
}

fn commit_all(dir: &Path) {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", "update"]);
}

/// Initialize a git repo with a minimal project and an initial commit.
fn init_git_project(dir: &Path) {
    write(dir, "Cargo.toml", "[package]\nname = \"test\"\n");
    write(dir, "src/main.rs", "fn main() {}\n");
    write(dir, "src/lib.rs", "pub fn lib() {}\n");
    write(dir, "docs/guide.md", "guide\n");

    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.email", "test@test.com"]);
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    commit_all(dir);
}

fn excluding(globs: &[&str]) -> PathMatcher {
    PathMatcher::new(MatcherConfig {
        exclude_globs: globs.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    })
    .unwrap()
}

fn image(mappings: Vec<GitMapping>) -> ImageConfig {
    ImageConfig {
        name: "backend".to_owned(),
        git: mappings,
    }
}

fn digest(repo: &Git2Repository, image: &ImageConfig, dev: bool) -> String {
    let options = StageOptions {
        dev,
        ..Default::default()
    };
    image_digest(repo, "HEAD", image, &options).unwrap().digest
}

// ── Bundle Tests ──

#[test]
fn bundle_contains_only_selected_files() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();
    let options = LsTreeOptions {
        all_files: true,
        ..Default::default()
    };
    let result = ls_tree(&repo, "HEAD", &excluding(&["docs"]), &options).unwrap();

    let out = TempDir::new().unwrap();
    let dest = out.path().join("bundle");
    let summary = create_bundle(&repo, &result, &dest).unwrap();

    assert_eq!(summary.files, 3);
    assert_eq!(
        std::fs::read_to_string(dest.join("src/main.rs")).unwrap(),
        "fn main() {}\n"
    );
    assert!(dest.join("Cargo.toml").exists());
    assert!(!dest.join("docs").exists());
}

#[test]
fn bundle_expands_directories_taken_whole() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();
    let matcher = PathMatcher::base_path("src", None).unwrap();
    let result = ls_tree(&repo, "HEAD", &matcher, &LsTreeOptions::default()).unwrap();
    assert_eq!(result.entries.len(), 1);

    let out = TempDir::new().unwrap();
    let summary = create_bundle(&repo, &result, out.path()).unwrap();

    assert_eq!(summary.files, 2);
    assert!(out.path().join("src/lib.rs").exists());
    assert!(!out.path().join("Cargo.toml").exists());
}

#[test]
fn bundle_replaces_previous_content() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();
    let result = ls_tree(&repo, "HEAD", &excluding(&["docs"]), &LsTreeOptions::default()).unwrap();

    let out = TempDir::new().unwrap();
    write(out.path(), "stale.txt", "old");
    create_bundle(&repo, &result, out.path()).unwrap();

    assert!(!out.path().join("stale.txt").exists());
    assert!(out.path().join("src/main.rs").exists());
}

#[cfg(unix)]
#[test]
fn bundle_keeps_modes_and_symlinks() {
    use std::os::unix::fs::PermissionsExt;

    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    write(project.path(), "bin/run.sh", "#!/bin/sh\n");
    std::fs::set_permissions(
        project.path().join("bin/run.sh"),
        std::fs::Permissions::from_mode(0o755),
    )
    .unwrap();
    std::os::unix::fs::symlink("../src/main.rs", project.path().join("bin/main.rs")).unwrap();
    commit_all(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();
    let result = ls_tree(
        &repo,
        "HEAD",
        &PathMatcher::include(&["bin"]).unwrap(),
        &LsTreeOptions::default(),
    )
    .unwrap();

    let out = TempDir::new().unwrap();
    let summary = create_bundle(&repo, &result, out.path()).unwrap();

    assert_eq!(summary.files, 1);
    assert_eq!(summary.symlinks, 1);
    let mode = std::fs::metadata(out.path().join("bin/run.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111);
    assert_eq!(
        std::fs::read_link(out.path().join("bin/main.rs")).unwrap(),
        Path::new("../src/main.rs")
    );
}

#[cfg(unix)]
#[test]
fn bundle_rejects_symlinks_escaping_the_bundle() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    std::os::unix::fs::symlink("../../secret", project.path().join("src/escape")).unwrap();
    commit_all(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();
    let result = ls_tree(&repo, "HEAD", &PathMatcher::True, &LsTreeOptions::default()).unwrap();

    let out = TempDir::new().unwrap();
    let err = create_bundle(&repo, &result, out.path()).unwrap_err();

    assert!(matches!(err, BundleError::SymlinkEscapesScope { path, .. } if path == "src/escape"));
}

// ── Stage Digest Tests ──

#[test]
fn image_digest_tracks_selected_content_only() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();
    let image = image(vec![GitMapping {
        add: "/".to_owned(),
        exclude_paths: vec!["docs".to_owned()],
        ..Default::default()
    }]);

    let before = digest(&repo, &image, false);
    assert_eq!(before.len(), 64);

    write(project.path(), "docs/guide.md", "new guide\n");
    commit_all(project.path());
    assert_eq!(digest(&repo, &image, false), before);

    write(project.path(), "src/lib.rs", "pub fn lib() -> u8 { 0 }\n");
    commit_all(project.path());
    assert_ne!(digest(&repo, &image, false), before);
}

#[test]
fn image_digest_depends_on_selection_rules() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();

    let everything = image(vec![GitMapping::default()]);
    let sources = image(vec![GitMapping {
        add: "/src".to_owned(),
        ..Default::default()
    }]);

    let digest_all = image_digest(&repo, "HEAD", &everything, &StageOptions::default()).unwrap();
    let digest_src = image_digest(&repo, "HEAD", &sources, &StageOptions::default()).unwrap();

    assert_eq!(digest_all.mappings[0].matcher_id, "");
    assert_ne!(digest_src.mappings[0].matcher_id, "");
    assert_ne!(digest_all.digest, digest_src.digest);
}

#[test]
fn ignore_file_is_read_from_the_commit() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    write(project.path(), ".dockerignore", "# docs are not built\ndocs\n");
    commit_all(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();
    let image = image(vec![GitMapping {
        ignore_file: Some(".dockerignore".to_owned()),
        ..Default::default()
    }]);

    let before = digest(&repo, &image, false);
    write(project.path(), "docs/guide.md", "changed\n");
    commit_all(project.path());

    assert_eq!(digest(&repo, &image, false), before);
}

#[test]
fn missing_ignore_file_applies_no_patterns() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();
    let with_missing = image(vec![GitMapping {
        ignore_file: Some(".dockerignore".to_owned()),
        ..Default::default()
    }]);

    assert_eq!(
        digest(&repo, &with_missing, false),
        digest(&repo, &image(vec![GitMapping::default()]), false)
    );
}

#[test]
fn dev_mode_folds_in_worktree_changes() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();
    let image = image(vec![GitMapping::default()]);

    let committed = digest(&repo, &image, false);
    let dev_clean = digest(&repo, &image, true);
    write(project.path(), "src/main.rs", "fn main() { edit(); }\n");

    assert_eq!(digest(&repo, &image, false), committed);
    assert_ne!(digest(&repo, &image, true), dev_clean);
}

#[test]
fn image_without_git_sources_has_no_digest() {
    let project = TempDir::new().unwrap();
    init_git_project(project.path());
    let repo = Git2Repository::open(project.path()).unwrap();

    assert_eq!(digest(&repo, &image(Vec::new()), false), "");
}
