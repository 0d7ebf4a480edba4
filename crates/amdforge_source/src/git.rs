use std::path::{Path, PathBuf};

use amdforge_error::{BuildError, BuildResult};
use tokio::process::Command;

/// Thin wrapper over the `git` binary for one repository directory, driven
/// entirely through `--git-dir` / `--work-tree` so it works against bare
/// clones.
pub(crate) struct GitRepo {
  git_dir: PathBuf,
}

impl GitRepo {
  pub fn new(git_dir: PathBuf) -> Self {
    Self { git_dir }
  }

  /// Fetches refs and tags from the repository's default remote.
  pub async fn fetch(&self) -> BuildResult<()> {
    self.run(&["fetch", "-t"]).await.map(drop)
  }

  /// Forcibly checks `reference` out into `work_tree`. `core.bare` is
  /// overridden so a bare clone accepts the detached work tree.
  pub async fn checkout(&self, work_tree: &Path, reference: &str) -> BuildResult<()> {
    self
      .run(&[
        &format!("--work-tree={}", work_tree.display()),
        "-c",
        "core.bare=false",
        "checkout",
        "-f",
        reference,
      ])
      .await
      .map(drop)
  }

  async fn run(&self, args: &[&str]) -> BuildResult<String> {
    let mut command = Command::new("git");
    command.arg(format!("--git-dir={}", self.git_dir.display()));
    command.args(args);
    tracing::debug!(git_dir = %self.git_dir.display(), ?args, "running git");

    let output = command
      .output()
      .await
      .map_err(|err| BuildError::Source(format!("failed to spawn git: {err}")))?;
    if !output.status.success() {
      return Err(BuildError::Source(
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
      ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }
}
