use std::path::PathBuf;

use mockall::mock;
use proptest::prelude::*;
use werf_git::{
    ChangeKind, EntryMode, FileState, GitError, GitRepository, LsTreeOptions, LsTreeResult,
    ObjectId, StatusOptions, Submodule, SubmoduleHandle, SubmoduleResult, TreeEntry, TreeItem,
    WorktreeChange, ls_tree, status,
};
use werf_matcher::{MatcherConfig, PathMatcher};

mock! {
    Repository {}

    impl GitRepository for Repository {
        fn commit_tree(&self, revision: &str) -> Result<ObjectId, GitError>;
        fn tree_entries(&self, tree: &ObjectId) -> Result<Vec<TreeItem>, GitError>;
        fn read_blob(&self, blob: &ObjectId) -> Result<Vec<u8>, GitError>;
        fn open_submodule(&self, path: &str) -> Result<SubmoduleHandle, GitError>;
        fn worktree_status(&self) -> Result<Vec<WorktreeChange>, GitError>;
        fn workdir(&self) -> Option<PathBuf>;
    }
}

fn item(name: &str, mode: EntryMode, id: &str) -> TreeItem {
    TreeItem {
        name: name.to_owned(),
        mode,
        id: ObjectId::new(id),
    }
}

fn entry(path: &str, mode: EntryMode, id: &str) -> TreeEntry {
    TreeEntry {
        path: path.to_owned(),
        mode,
        id: ObjectId::new(id),
    }
}

fn include(globs: &[&str]) -> PathMatcher {
    PathMatcher::include(globs).unwrap()
}

/// A repository with `src/{lib.rs,notes.md}`, `target/` and `README.md`.
fn project_repo() -> MockRepository {
    let mut repo = MockRepository::new();
    repo.expect_commit_tree()
        .withf(|rev| rev == "HEAD")
        .returning(|_| Ok(ObjectId::new("root")));
    repo.expect_tree_entries()
        .withf(|tree| tree.as_str() == "root")
        .times(1)
        .returning(|_| {
            Ok(vec![
                item("README.md", EntryMode::File, "b-readme"),
                item("src", EntryMode::Dir, "t-src"),
                item("target", EntryMode::Dir, "t-target"),
            ])
        });
    repo
}

fn expect_src(repo: &mut MockRepository) {
    repo.expect_tree_entries()
        .withf(|tree| tree.as_str() == "t-src")
        .times(1)
        .returning(|_| {
            Ok(vec![
                item("lib.rs", EntryMode::File, "b-lib"),
                item("notes.md", EntryMode::File, "b-notes"),
            ])
        });
}

// ── Pruning ──

#[test]
fn excluded_subtrees_are_never_read() {
    let mut repo = project_repo();
    expect_src(&mut repo);
    // No expectation for `t-target`: reading it would fail the test.

    let result = ls_tree(
        &repo,
        "HEAD",
        &include(&["src/**/*.rs"]),
        &LsTreeOptions::default(),
    )
    .unwrap();

    assert_eq!(result.entries, vec![entry("src/lib.rs", EntryMode::File, "b-lib")]);
    assert!(result.submodule_results.is_empty());
}

#[test]
fn fully_matched_directories_are_taken_whole() {
    let repo = project_repo();

    let result = ls_tree(
        &repo,
        "HEAD",
        &include(&["src"]),
        &LsTreeOptions::default(),
    )
    .unwrap();

    assert_eq!(result.entries, vec![entry("src", EntryMode::Dir, "t-src")]);
}

#[test]
fn all_files_enumerates_matched_directories() {
    let mut repo = project_repo();
    expect_src(&mut repo);

    let options = LsTreeOptions {
        all_files: true,
        ..Default::default()
    };
    let result = ls_tree(&repo, "HEAD", &include(&["src"]), &options).unwrap();

    assert_eq!(
        result.entries,
        vec![
            entry("src/lib.rs", EntryMode::File, "b-lib"),
            entry("src/notes.md", EntryMode::File, "b-notes"),
        ]
    );
}

#[test]
fn files_under_a_pending_exclude_are_kept() {
    let mut repo = project_repo();
    expect_src(&mut repo);
    repo.expect_tree_entries()
        .withf(|tree| tree.as_str() == "t-target")
        .times(1)
        .returning(|_| Ok(vec![item("foo", EntryMode::File, "b-foo")]));

    let matcher = PathMatcher::exclude(&["*/foo"]).unwrap();
    let result = ls_tree(&repo, "HEAD", &matcher, &LsTreeOptions::default()).unwrap();

    let paths: Vec<&str> = result.entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["README.md", "src/lib.rs", "src/notes.md"]);
}

#[test]
fn object_read_failures_propagate() {
    let mut repo = project_repo();
    repo.expect_tree_entries()
        .withf(|tree| tree.as_str() == "t-src")
        .returning(|tree| {
            Err(GitError::ObjectRead {
                object: tree.to_string(),
                source: git2::Error::from_str("corrupt object"),
            })
        });

    let result = ls_tree(
        &repo,
        "HEAD",
        &include(&["src/*.rs"]),
        &LsTreeOptions::default(),
    );

    assert!(matches!(result, Err(GitError::ObjectRead { object, .. }) if object == "t-src"));
}

// ── Path scope ──

#[test]
fn path_scope_walks_only_the_scoped_entry() {
    let mut repo = project_repo();
    expect_src(&mut repo);

    let options = LsTreeOptions {
        path_scope: "src/lib.rs".to_owned(),
        ..Default::default()
    };
    let result = ls_tree(&repo, "HEAD", &PathMatcher::True, &options).unwrap();

    assert_eq!(result.entries, vec![entry("src/lib.rs", EntryMode::File, "b-lib")]);
}

#[test]
fn missing_path_scope_yields_an_empty_result() {
    let repo = project_repo();

    let options = LsTreeOptions {
        path_scope: "docs".to_owned(),
        ..Default::default()
    };
    let result = ls_tree(&repo, "HEAD", &PathMatcher::True, &options).unwrap();

    assert!(result.is_empty());
    assert_eq!(result.checksum(), "");
}

// ── Submodules ──

fn repo_with_submodule() -> MockRepository {
    let mut repo = MockRepository::new();
    repo.expect_commit_tree()
        .returning(|_| Ok(ObjectId::new("root")));
    repo.expect_tree_entries()
        .withf(|tree| tree.as_str() == "root")
        .returning(|_| {
            Ok(vec![
                item("main.rs", EntryMode::File, "b-main"),
                item("vendor", EntryMode::Submodule, "c-vendor"),
            ])
        });
    repo
}

fn submodule_repo() -> MockRepository {
    let mut sub = MockRepository::new();
    sub.expect_commit_tree()
        .withf(|rev| rev == "c-vendor")
        .returning(|_| Ok(ObjectId::new("sub-root")));
    sub.expect_tree_entries()
        .withf(|tree| tree.as_str() == "sub-root")
        .returning(|_| {
            Ok(vec![
                item("lib", EntryMode::Dir, "t-lib"),
                item("README", EntryMode::File, "b-sub-readme"),
            ])
        });
    sub.expect_tree_entries()
        .withf(|tree| tree.as_str() == "t-lib")
        .returning(|_| Ok(vec![item("a.rs", EntryMode::File, "b-a")]));
    sub
}

#[test]
fn bulk_matched_submodules_are_not_opened() {
    let repo = repo_with_submodule();

    let result = ls_tree(&repo, "HEAD", &PathMatcher::True, &LsTreeOptions::default()).unwrap();

    assert_eq!(
        result.entries,
        vec![
            entry("main.rs", EntryMode::File, "b-main"),
            entry("vendor", EntryMode::Submodule, "c-vendor"),
        ]
    );
}

#[test]
fn submodule_entries_are_prefixed_with_the_submodule_path() {
    let mut repo = repo_with_submodule();
    let sub = submodule_repo();
    repo.expect_open_submodule()
        .withf(|path| path == "vendor")
        .return_once(move |_| {
            Ok(SubmoduleHandle::Initialized(Submodule {
                name: "vendor".to_owned(),
                repository: Box::new(sub),
                current_commit: Some(ObjectId::new("c-vendor")),
                is_clean: true,
            }))
        });

    let result = ls_tree(
        &repo,
        "HEAD",
        &include(&["vendor/lib/*.rs"]),
        &LsTreeOptions::default(),
    )
    .unwrap();

    assert!(result.entries.is_empty());
    assert_eq!(result.submodule_results.len(), 1);
    let submodule = &result.submodule_results[0];
    assert_eq!(submodule.name, "vendor");
    assert_eq!(submodule.relative_path, "vendor");
    assert!(!submodule.is_not_clean);
    assert_eq!(
        submodule.result.entries,
        vec![entry("vendor/lib/a.rs", EntryMode::File, "b-a")]
    );
    assert_eq!(result.all_entries().len(), 1);
}

#[test]
fn uninitialized_submodules_are_recorded() {
    let mut repo = repo_with_submodule();
    repo.expect_open_submodule()
        .returning(|_| Ok(SubmoduleHandle::NotInitialized));

    let result = ls_tree(
        &repo,
        "HEAD",
        &include(&["vendor/lib"]),
        &LsTreeOptions::default(),
    )
    .unwrap();

    assert_eq!(result.not_initialized_submodule_paths, ["vendor"]);
    assert!(!result.is_empty());
    assert_ne!(result.checksum(), "");
}

#[test]
fn missing_recorded_commit_counts_as_not_initialized() {
    let mut repo = repo_with_submodule();
    let mut sub = MockRepository::new();
    sub.expect_commit_tree().returning(|rev| {
        Err(GitError::CommitNotFound {
            commit: rev.to_owned(),
            source: git2::Error::from_str("object not found"),
        })
    });
    repo.expect_open_submodule().return_once(move |_| {
        Ok(SubmoduleHandle::Initialized(Submodule {
            name: "vendor".to_owned(),
            repository: Box::new(sub),
            current_commit: None,
            is_clean: true,
        }))
    });

    let result = ls_tree(
        &repo,
        "HEAD",
        &include(&["vendor/lib"]),
        &LsTreeOptions::default(),
    )
    .unwrap();

    assert_eq!(result.not_initialized_submodule_paths, ["vendor"]);
    assert!(result.submodule_results.is_empty());
}

#[test]
fn all_files_descends_into_bulk_matched_submodules() {
    let mut repo = repo_with_submodule();
    let sub = submodule_repo();
    repo.expect_open_submodule().return_once(move |_| {
        Ok(SubmoduleHandle::Initialized(Submodule {
            name: "vendor".to_owned(),
            repository: Box::new(sub),
            current_commit: Some(ObjectId::new("c-vendor")),
            is_clean: true,
        }))
    });

    let matcher = PathMatcher::new(MatcherConfig::default()).unwrap();
    let options = LsTreeOptions {
        all_files: true,
        ..Default::default()
    };
    let result = ls_tree(&repo, "HEAD", &matcher, &options).unwrap();

    let paths: Vec<&str> = result.all_entries().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["main.rs", "vendor/README", "vendor/lib/a.rs"]);
}

// ── Status ──

#[test]
fn changed_file_missing_from_worktree_counts_as_deleted() {
    let workdir = tempfile::TempDir::new().unwrap();
    std::fs::write(workdir.path().join("kept.rs"), "kept").unwrap();
    let root = workdir.path().to_path_buf();
    let mut repo = MockRepository::new();
    repo.expect_workdir().returning(move || Some(root.clone()));
    repo.expect_worktree_status().times(1).returning(|| {
        Ok(vec![
            WorktreeChange {
                path: "gone.rs".to_owned(),
                kind: ChangeKind::Modified,
                is_submodule: false,
            },
            WorktreeChange {
                path: "kept.rs".to_owned(),
                kind: ChangeKind::Untracked,
                is_submodule: false,
            },
        ])
    });

    let result = status(&repo, &PathMatcher::True, &StatusOptions::default()).unwrap();

    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.entries[0].path, "gone.rs");
    assert_eq!(result.entries[0].state, FileState::Deleted);
    assert!(matches!(result.entries[1].state, FileState::Present { .. }));
}

// ── Checksum ──

fn submodule_result(entries: Vec<TreeEntry>, is_not_clean: bool) -> SubmoduleResult {
    SubmoduleResult {
        name: "vendor".to_owned(),
        relative_path: "vendor".to_owned(),
        is_not_clean,
        current_commit: Some(ObjectId::new("c-current")),
        result: LsTreeResult {
            entries,
            ..Default::default()
        },
    }
}

#[test]
fn empty_result_has_empty_checksum() {
    let result = LsTreeResult {
        submodule_results: vec![submodule_result(Vec::new(), true)],
        ..Default::default()
    };
    assert!(result.is_empty());
    assert_eq!(result.checksum(), "");
}

#[test]
fn uninitialized_and_empty_initialized_submodules_differ() {
    let uninitialized = LsTreeResult {
        not_initialized_submodule_paths: vec!["vendor".to_owned()],
        ..Default::default()
    };
    let initialized = LsTreeResult {
        submodule_results: vec![submodule_result(Vec::new(), false)],
        ..Default::default()
    };
    assert_ne!(uninitialized.checksum(), initialized.checksum());
}

#[test]
fn dirty_submodules_change_the_checksum() {
    let files = vec![entry("vendor/a.rs", EntryMode::File, "b-a")];
    let clean = LsTreeResult {
        submodule_results: vec![submodule_result(files.clone(), false)],
        ..Default::default()
    };
    let dirty = LsTreeResult {
        submodule_results: vec![submodule_result(files, true)],
        ..Default::default()
    };
    assert_ne!(clean.checksum(), dirty.checksum());
}

#[test]
fn checksum_covers_mode_and_object() {
    let base = LsTreeResult {
        entries: vec![entry("run.sh", EntryMode::File, "b-run")],
        ..Default::default()
    };
    let executable = LsTreeResult {
        entries: vec![entry("run.sh", EntryMode::Executable, "b-run")],
        ..Default::default()
    };
    let edited = LsTreeResult {
        entries: vec![entry("run.sh", EntryMode::File, "b-run-2")],
        ..Default::default()
    };
    assert_ne!(base.checksum(), executable.checksum());
    assert_ne!(base.checksum(), edited.checksum());
    assert_eq!(base.checksum().len(), 64);
}

fn entries_strategy() -> impl Strategy<Value = Vec<TreeEntry>> {
    prop::collection::btree_map("[a-z]{1,6}(/[a-z]{1,6}){0,2}", "[0-9a-f]{40}", 1..24).prop_map(
        |files| {
            files
                .into_iter()
                .map(|(path, id)| entry(&path, EntryMode::File, &id))
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn checksum_does_not_depend_on_entry_order(
        (entries, shuffled) in entries_strategy()
            .prop_flat_map(|entries| (Just(entries.clone()), Just(entries).prop_shuffle()))
    ) {
        let a = LsTreeResult { entries, ..Default::default() };
        let b = LsTreeResult { entries: shuffled, ..Default::default() };
        prop_assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn checksum_does_not_depend_on_submodule_order(
        paths in prop::collection::btree_set("[a-z]{1,6}", 2..6)
    ) {
        let forward: Vec<String> = paths.iter().cloned().collect();
        let mut backward = forward.clone();
        backward.reverse();
        let a = LsTreeResult { not_initialized_submodule_paths: forward, ..Default::default() };
        let b = LsTreeResult { not_initialized_submodule_paths: backward, ..Default::default() };
        prop_assert_eq!(a.checksum(), b.checksum());
    }
}
