use std::path::{Path, PathBuf};
use std::process::Command;

use amdforge_common::{ProjectRef, SourceProvider};
use amdforge_error::BuildError;
use amdforge_source::GitSourceProvider;

fn git(dir: &Path, args: &[&str]) {
  let status = Command::new("git")
    .current_dir(dir)
    .args([
      "-c",
      "user.email=dev@example.com",
      "-c",
      "user.name=dev",
      "-c",
      "init.defaultBranch=main",
    ])
    .args(args)
    .status()
    .unwrap();
  assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

/// Creates a bare clone at `<root>/repos/acme/widgets.git` with one commit
/// on `main` containing `main.js`.
fn seed_repository(root: &Path) -> PathBuf {
  let work = root.join("work");
  std::fs::create_dir_all(&work).unwrap();
  git(&work, &["init"]);
  std::fs::write(work.join("main.js"), "define([\"./widget\"], function (w) {});\n").unwrap();
  std::fs::write(work.join("widget.js"), "define([], function () {});\n").unwrap();
  git(&work, &["add", "-A"]);
  git(&work, &["commit", "-m", "initial"]);

  let repos = root.join("repos/acme");
  std::fs::create_dir_all(&repos).unwrap();
  git(root, &["clone", "--bare", "work", "repos/acme/widgets.git"]);
  repos.join("widgets.git")
}

#[tokio::test]
async fn materializes_and_reuses_a_workspace() {
  let tmp = tempfile::tempdir().unwrap();
  seed_repository(tmp.path());
  let provider = GitSourceProvider::new(tmp.path().join("repos"), tmp.path().join("staging"));
  let project = ProjectRef::new("acme", "widgets", "main");

  let ws = provider.ensure_workspace(&project).await.unwrap();
  assert_eq!(ws.root(), tmp.path().join("staging/acme/main/widgets"));
  assert!(ws.root().join("main.js").exists());

  // A populated workspace is returned as-is, local edits included.
  std::fs::write(ws.root().join("local.txt"), "scratch").unwrap();
  let again = provider.ensure_workspace(&project).await.unwrap();
  assert!(again.root().join("local.txt").exists());
}

#[tokio::test]
async fn an_empty_directory_is_checked_out_into() {
  let tmp = tempfile::tempdir().unwrap();
  seed_repository(tmp.path());
  let provider = GitSourceProvider::new(tmp.path().join("repos"), tmp.path().join("staging"));
  let project = ProjectRef::new("acme", "widgets", "main");

  std::fs::create_dir_all(tmp.path().join("staging/acme/main/widgets")).unwrap();
  let ws = provider.ensure_workspace(&project).await.unwrap();
  assert!(ws.root().join("main.js").exists());
}

#[tokio::test]
async fn missing_repository_and_reference_are_distinct_errors() {
  let tmp = tempfile::tempdir().unwrap();
  seed_repository(tmp.path());
  let provider = GitSourceProvider::new(tmp.path().join("repos"), tmp.path().join("staging"));

  let err = provider.ensure_workspace(&ProjectRef::new("acme", "ghost", "main")).await.unwrap_err();
  assert!(matches!(err, BuildError::RepoNotFound { repo, .. } if repo == "ghost"));

  let err =
    provider.ensure_workspace(&ProjectRef::new("acme", "widgets", "ghost-ref")).await.unwrap_err();
  assert!(matches!(err, BuildError::RefNotFound { reference, .. } if reference == "ghost-ref"));
}

#[tokio::test]
async fn refresh_rebuilds_the_workspace_and_compiled_dir() {
  let tmp = tempfile::tempdir().unwrap();
  seed_repository(tmp.path());
  let provider = GitSourceProvider::new(tmp.path().join("repos"), tmp.path().join("staging"));
  let project = ProjectRef::new("acme", "widgets", "main");

  let ws = provider.ensure_workspace(&project).await.unwrap();
  std::fs::create_dir_all(ws.compiled_dir()).unwrap();
  std::fs::write(ws.compiled_dir().join("stale.js"), "old artifact").unwrap();

  let refreshed = provider.refresh(&project).await.unwrap();
  assert_eq!(refreshed.root(), ws.root());
  assert!(refreshed.root().join("main.js").exists());
  assert!(refreshed.compiled_dir().exists());
  assert!(!refreshed.compiled_dir().join("stale.js").exists());
}
