use std::path::Path;
use std::sync::Arc;

use amdforge_common::{Optimizer, WorkspaceLayout};
use amdforge_error::{BuildError, BuildResult};

use crate::filter::FilterRegistry;
use crate::graph::GraphBuilder;

mod archive;
mod script;
mod style;
mod zip_pack;

pub(crate) use archive::ArchiveBuild;
pub(crate) use script::ScriptBuild;
pub(crate) use style::StyleBuild;

/// Collaborators shared by every assembler for one workspace.
#[derive(Clone)]
pub(crate) struct BuildContext {
  pub workspace: WorkspaceLayout,
  pub optimizer: Arc<dyn Optimizer>,
  pub filters: Arc<FilterRegistry>,
  pub graphs: Arc<GraphBuilder>,
}

pub(crate) async fn artifact_exists(path: &Path) -> bool {
  tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Runs the request's filter over a finished artifact file in place.
pub(crate) async fn apply_filter(
  filters: &FilterRegistry,
  filter: Option<&str>,
  path: &Path,
  ext: &str,
) -> BuildResult<()> {
  if filter.is_none() {
    return Ok(());
  }
  let content =
    tokio::fs::read_to_string(path).await.map_err(|err| BuildError::persist(path, err))?;
  let filtered = filters.apply(filter, content, ext)?;
  tokio::fs::write(path, filtered).await.map_err(|err| BuildError::persist(path, err))
}
