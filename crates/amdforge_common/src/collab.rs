use std::collections::BTreeMap;
use std::path::PathBuf;

use amdforge_error::BuildResult;

use crate::{OptimizeMode, ProjectRef, WorkspaceLayout};

/// Declarative configuration handed to the optimizer for a script build.
/// The optimizer owns dependency tracing and writes its result to `out`.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
  /// Absolute module-resolution root.
  pub base_url: PathBuf,
  pub include: Vec<String>,
  pub exclude: Vec<String>,
  pub out: PathBuf,
  pub optimize: OptimizeMode,
  pub skip_module_insertion: bool,
  pub preserve_license_comments: bool,
  /// Arbitrary pass-through options (pragmas etc.), not interpreted here.
  pub extra: BTreeMap<String, serde_json::Value>,
}

/// Configuration for the optimizer's style-optimization mode.
#[derive(Debug, Clone)]
pub struct StyleOptimizeConfig {
  pub css_in: PathBuf,
  pub out: PathBuf,
  /// Optimization token, `"standard"` for the default pipeline.
  pub optimize_css: String,
}

impl StyleOptimizeConfig {
  pub fn standard(css_in: PathBuf, out: PathBuf) -> Self {
    Self { css_in, out, optimize_css: "standard".to_string() }
  }
}

/// The external bundling/minification engine. Failures must surface the
/// engine's own diagnostic message; the pipeline passes it through verbatim.
#[async_trait::async_trait]
pub trait Optimizer: Send + Sync {
  async fn optimize(&self, config: &OptimizerConfig) -> BuildResult<()>;

  async fn optimize_style(&self, config: &StyleOptimizeConfig) -> BuildResult<()>;
}

/// Materializes and refreshes workspaces for source-control references.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
  /// Returns the workspace for `project`, materializing it first when the
  /// directory is missing or exists but is empty.
  async fn ensure_workspace(&self, project: &ProjectRef) -> BuildResult<WorkspaceLayout>;

  /// Fetches the latest refs for the project's repository.
  async fn fetch(&self, project: &ProjectRef) -> BuildResult<()>;

  /// Re-materializes the workspace at the project's reference and resets its
  /// compiled-output directory. The caller is responsible for invalidating
  /// build caches afterwards.
  async fn refresh(&self, project: &ProjectRef) -> BuildResult<WorkspaceLayout>;
}

/// A registered post-processing transform applied to finished bundle text.
/// `ext` is the target artifact extension (".js", ".min.css", ...) so one
/// filter can treat artifact flavors differently.
pub trait BundleFilter: Send + Sync {
  fn apply(&self, content: String, ext: &str) -> Result<String, String>;
}

impl<F> BundleFilter for F
where
  F: Fn(String, &str) -> Result<String, String> + Send + Sync,
{
  fn apply(&self, content: String, ext: &str) -> Result<String, String> {
    self(content, ext)
  }
}
