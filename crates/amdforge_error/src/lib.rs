use std::path::PathBuf;

/// Failure taxonomy for the whole build pipeline.
///
/// Every variant keeps the most actionable diagnostic it has (optimizer
/// output, git stderr, the underlying io message) verbatim. The enum is
/// `Clone` because a settled build is observed by every request that
/// deduplicated onto its fingerprint.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
  #[error("ref '{reference}' not found in {owner}/{repo}")]
  RefNotFound { owner: String, repo: String, reference: String },

  #[error("repository {owner}/{repo} has not been cloned")]
  RepoNotFound { owner: String, repo: String },

  #[error("workspace for {repo}/{reference} has not been created")]
  WorkspaceMissing { repo: String, reference: String },

  #[error("failed to read module '{module}': {reason}")]
  ModuleRead { module: String, reason: String },

  #[error("failed to parse module '{module}': {reason}")]
  ModuleParse { module: String, reason: String },

  #[error("dependency graph cache {path} is corrupt: {reason}")]
  GraphCacheCorrupt { path: PathBuf, reason: String },

  #[error("optimizer failed: {0}")]
  OptimizerFailure(String),

  #[error("failed to concatenate '{path}': {reason}")]
  Concatenation { path: PathBuf, reason: String },

  #[error("filter '{filter}' failed: {reason}")]
  Filter { filter: String, reason: String },

  #[error("failed to persist '{path}': {reason}")]
  Persist { path: PathBuf, reason: String },

  #[error("background task failed: {0}")]
  TaskJoin(String),

  #[error("archive sub-build failed: {0}")]
  PartialArchive(Box<BuildError>),

  #[error("artifact '{path}' vanished after build")]
  StaleArtifact { path: PathBuf },

  #[error("source provider failed: {0}")]
  Source(String),
}

impl BuildError {
  pub fn module_read(module: impl Into<String>, reason: impl ToString) -> Self {
    Self::ModuleRead { module: module.into(), reason: reason.to_string() }
  }

  pub fn module_parse(module: impl Into<String>, reason: impl ToString) -> Self {
    Self::ModuleParse { module: module.into(), reason: reason.to_string() }
  }

  pub fn persist(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
    Self::Persist { path: path.into(), reason: reason.to_string() }
  }

  pub fn concatenation(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
    Self::Concatenation { path: path.into(), reason: reason.to_string() }
  }
}

pub type BuildResult<T> = Result<T, BuildError>;
