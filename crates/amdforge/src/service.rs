use std::path::PathBuf;
use std::sync::Arc;

use amdforge_common::{
  BuildRequest, BundleConfig, DependencyGraph, Optimizer, OutputKind, ProjectRef,
  SourceProvider, WorkspaceLayout,
};
use amdforge_error::{BuildError, BuildResult};

use crate::assembler::{ArchiveBuild, BuildContext, ScriptBuild, StyleBuild};
use crate::cache::{BuildCache, BuildOutput};
use crate::filter::FilterRegistry;
use crate::fingerprint::build_fingerprint;
use crate::graph::GraphBuilder;

/// A finished bundle, ready to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
  pub kind: OutputKind,
  pub mime_type: &'static str,
  /// Artifact files on disk, in serving order. Script and archive builds
  /// produce exactly one; style builds one per non-empty group.
  pub files: Vec<PathBuf>,
}

/// The build pipeline behind the bundle endpoint.
///
/// Ties the source provider, the dependency-graph builder, the build cache,
/// the assemblers, and the filter registry together. One instance serves
/// every project; all state is keyed by fingerprint or workspace root.
pub struct BuildService {
  source: Arc<dyn SourceProvider>,
  optimizer: Arc<dyn Optimizer>,
  filters: Arc<FilterRegistry>,
  cache: Arc<BuildCache>,
  graphs: Arc<GraphBuilder>,
}

impl BuildService {
  pub fn new(source: Arc<dyn SourceProvider>, optimizer: Arc<dyn Optimizer>) -> Self {
    Self {
      source,
      optimizer,
      filters: Arc::new(FilterRegistry::new()),
      cache: Arc::new(BuildCache::new()),
      graphs: Arc::new(GraphBuilder::new()),
    }
  }

  pub fn filters(&self) -> &FilterRegistry {
    &self.filters
  }

  pub fn graphs(&self) -> &GraphBuilder {
    &self.graphs
  }

  /// Builds (or serves from cache) the bundle a request describes.
  ///
  /// A cached entry whose artifact files have vanished from disk is evicted
  /// and rebuilt exactly once; if the rebuilt artifact is gone too, the
  /// request fails rather than loop.
  pub async fn bundle(&self, request: &BuildRequest) -> BuildResult<BundleArtifact> {
    let digest = build_fingerprint(request);
    let workspace = self.source.ensure_workspace(&request.project).await?;

    let kind = request.kind();
    let cache_key = self.cache_key(request, &digest);
    let mut output = self.run_cached(request, &workspace, &digest).await?;

    if let Some(missing) = first_missing(&output).await {
      tracing::warn!(
        project = %request.project,
        artifact = %missing.display(),
        "cached artifact vanished from disk, rebuilding"
      );
      self.cache.evict(kind, &cache_key);
      output = self.run_cached(request, &workspace, &digest).await?;
      if let Some(missing) = first_missing(&output).await {
        return Err(BuildError::StaleArtifact { path: missing });
      }
    }

    Ok(BundleArtifact { kind, mime_type: kind.mime_type(), files: output.files().to_vec() })
  }

  /// Builds (or loads) the dependency graph for a project's module set.
  pub async fn dependency_graph(
    &self,
    project: &ProjectRef,
    config: &BundleConfig,
  ) -> BuildResult<Arc<DependencyGraph>> {
    let workspace = self.source.ensure_workspace(project).await?;
    self.graphs.build_map(&workspace, &config.base_url, &config.include).await
  }

  /// Fetches the latest refs for the project's repository.
  pub async fn fetch(&self, project: &ProjectRef) -> BuildResult<()> {
    self.source.fetch(project).await
  }

  /// Re-materializes the project's workspace and drops every cache entry
  /// that belonged to it.
  pub async fn refresh(&self, project: &ProjectRef) -> BuildResult<()> {
    let workspace = self.source.refresh(project).await?;
    self.cache.invalidate_workspace(workspace.root());
    self.graphs.reset();
    tracing::info!(project = %project, "workspace refreshed");
    Ok(())
  }

  /// Cache key: the fingerprint, plus the optimization infix for kinds where
  /// one fingerprint yields distinct plain and minified artifacts. Archives
  /// always contain both levels, so their key is the bare fingerprint.
  fn cache_key(&self, request: &BuildRequest, digest: &str) -> String {
    match request.kind() {
      OutputKind::Archive => digest.to_string(),
      OutputKind::Script | OutputKind::Style => {
        format!("{digest}{}", request.optimize_mode().name_infix())
      }
    }
  }

  async fn run_cached(
    &self,
    request: &BuildRequest,
    workspace: &WorkspaceLayout,
    digest: &str,
  ) -> BuildResult<BuildOutput> {
    let ctx = BuildContext {
      workspace: workspace.clone(),
      optimizer: Arc::clone(&self.optimizer),
      filters: Arc::clone(&self.filters),
      graphs: Arc::clone(&self.graphs),
    };
    let request = request.clone();
    let digest = digest.to_string();
    let kind = request.kind();
    let key = self.cache_key(&request, &digest);
    let cache = Arc::clone(&self.cache);

    self
      .cache
      .get_or_create(kind, key, workspace.root(), move || match kind {
        OutputKind::Script => Box::pin(ScriptBuild { ctx, request, digest }.run()),
        OutputKind::Style => Box::pin(StyleBuild { ctx, request, digest }.run()),
        OutputKind::Archive => Box::pin(ArchiveBuild { ctx, request, digest, cache }.run()),
      })
      .await
  }
}

async fn first_missing(output: &BuildOutput) -> Option<PathBuf> {
  for file in output.files() {
    if !tokio::fs::try_exists(file).await.unwrap_or(false) {
      return Some(file.clone());
    }
  }
  None
}
