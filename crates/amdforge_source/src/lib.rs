use std::path::{Path, PathBuf};

use amdforge_common::{ProjectRef, SourceProvider, WorkspaceLayout};
use amdforge_error::{BuildError, BuildResult};

mod git;

use git::GitRepo;

/// Source provider backed by locally hosted git clones.
///
/// Repositories live under `<repo_root>/<owner>/<repo>[.git]` and are never
/// created here; they are provisioned out of band. Workspaces are detached
/// work trees checked out under `<staging_root>/<owner>/<ref>/<repo>`.
pub struct GitSourceProvider {
  repo_root: PathBuf,
  staging_root: PathBuf,
}

impl GitSourceProvider {
  pub fn new(repo_root: impl Into<PathBuf>, staging_root: impl Into<PathBuf>) -> Self {
    Self { repo_root: repo_root.into(), staging_root: staging_root.into() }
  }

  async fn locate_repo(&self, project: &ProjectRef) -> BuildResult<GitRepo> {
    for candidate in project.repo_dir_candidates(&self.repo_root) {
      if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        return Ok(GitRepo::new(candidate));
      }
    }
    Err(BuildError::RepoNotFound { owner: project.owner.clone(), repo: project.repo.clone() })
  }

  async fn checkout(&self, project: &ProjectRef, root: &Path) -> BuildResult<()> {
    let repo = self.locate_repo(project).await?;
    tokio::fs::create_dir_all(root).await.map_err(|err| BuildError::persist(root, err))?;
    repo.checkout(root, &project.reference).await.map_err(|err| match err {
      BuildError::Source(reason)
        if reason.contains("pathspec") || reason.contains("did not match") =>
      {
        BuildError::RefNotFound {
          owner: project.owner.clone(),
          repo: project.repo.clone(),
          reference: project.reference.clone(),
        }
      }
      other => other,
    })
  }
}

#[async_trait::async_trait]
impl SourceProvider for GitSourceProvider {
  async fn ensure_workspace(&self, project: &ProjectRef) -> BuildResult<WorkspaceLayout> {
    let root = project.workspace_dir(&self.staging_root);
    if dir_is_missing_or_empty(&root).await {
      tracing::info!(project = %project, root = %root.display(), "materializing workspace");
      self.checkout(project, &root).await?;
    }
    Ok(WorkspaceLayout::new(root))
  }

  async fn fetch(&self, project: &ProjectRef) -> BuildResult<()> {
    self.locate_repo(project).await?.fetch().await
  }

  async fn refresh(&self, project: &ProjectRef) -> BuildResult<WorkspaceLayout> {
    let root = project.workspace_dir(&self.staging_root);
    if tokio::fs::try_exists(&root).await.unwrap_or(false) {
      tokio::fs::remove_dir_all(&root).await.map_err(|err| BuildError::persist(&root, err))?;
    }
    self.checkout(project, &root).await?;

    let layout = WorkspaceLayout::new(root);
    let compiled = layout.compiled_dir();
    tokio::fs::create_dir_all(&compiled)
      .await
      .map_err(|err| BuildError::persist(&compiled, err))?;
    tracing::info!(project = %project, "workspace refreshed");
    Ok(layout)
  }
}

async fn dir_is_missing_or_empty(path: &Path) -> bool {
  match tokio::fs::read_dir(path).await {
    Ok(mut entries) => entries.next_entry().await.ok().flatten().is_none(),
    Err(_) => true,
  }
}
