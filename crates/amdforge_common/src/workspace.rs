use std::path::{Path, PathBuf};

use sugar_path::SugarPath;

use crate::OptimizeMode;

pub const COMPILED_DIR_NAME: &str = "__compiled";

/// Identity of a checked-out source tree: `owner/repo` at `ref`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef {
  pub owner: String,
  pub repo: String,
  pub reference: String,
}

impl ProjectRef {
  pub fn new(
    owner: impl Into<String>,
    repo: impl Into<String>,
    reference: impl Into<String>,
  ) -> Self {
    Self { owner: owner.into(), repo: repo.into(), reference: reference.into() }
  }

  /// Workspace directory under the staging root: `<staging>/<owner>/<ref>/<repo>`.
  pub fn workspace_dir(&self, staging_root: &Path) -> PathBuf {
    staging_root.join(&self.owner).join(&self.reference).join(&self.repo)
  }

  /// Candidate bare-repository directories under the repository root, probed
  /// in order: `<repos>/<owner>/<repo>` then `<repos>/<owner>/<repo>.git`.
  pub fn repo_dir_candidates(&self, repo_root: &Path) -> [PathBuf; 2] {
    let base = repo_root.join(&self.owner);
    [base.join(&self.repo), base.join(format!("{}.git", self.repo))]
  }
}

impl std::fmt::Display for ProjectRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}/{}@{}", self.owner, self.repo, self.reference)
  }
}

/// A materialized workspace and the canonical layout of everything the
/// pipeline persists beneath it. All artifact naming funnels through here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
  root: PathBuf,
}

impl WorkspaceLayout {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// The compiled-output directory owned by this workspace.
  pub fn compiled_dir(&self) -> PathBuf {
    self.root.join(COMPILED_DIR_NAME)
  }

  /// Resolves a relative base-url against the workspace root.
  pub fn resolution_base(&self, base_url: &str) -> PathBuf {
    self.root.join(base_url).normalize()
  }

  /// Persisted dependency-graph cache file for a module-set digest.
  pub fn graph_cache_path(&self, digest: &str) -> PathBuf {
    self.compiled_dir().join(format!("deps-{digest}.json"))
  }

  pub fn script_path(&self, digest: &str, optimize: OptimizeMode) -> PathBuf {
    self.compiled_dir().join(format!("{digest}{}.js", optimize.name_infix()))
  }

  /// Style bundles carry the group name between digest and extension, except
  /// for the implicit `default` group: `<digest>[.<group>][.min].css`.
  pub fn style_path(&self, digest: &str, group: &str, optimize: OptimizeMode) -> PathBuf {
    let group_infix =
      if group == crate::DEFAULT_GROUP { String::new() } else { format!(".{group}") };
    self.compiled_dir().join(format!("{digest}{group_infix}{}.css", optimize.name_infix()))
  }

  pub fn archive_path(&self, digest: &str) -> PathBuf {
    self.compiled_dir().join(format!("{digest}.zip"))
  }
}
