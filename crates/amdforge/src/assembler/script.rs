use amdforge_common::{BuildRequest, OptimizerConfig};
use amdforge_error::BuildResult;

use crate::assembler::{apply_filter, artifact_exists, BuildContext};
use crate::cache::BuildOutput;

/// Assembles one script bundle: trace from the entry modules, concatenate
/// through the optimizer, post-process with the request's filter, and leave
/// the artifact at its digest-derived path.
pub(crate) struct ScriptBuild {
  pub ctx: BuildContext,
  pub request: BuildRequest,
  pub digest: String,
}

impl ScriptBuild {
  pub async fn run(self) -> BuildResult<BuildOutput> {
    let mode = self.request.optimize_mode();
    let out = self.ctx.workspace.script_path(&self.digest, mode);
    if artifact_exists(&out).await {
      tracing::debug!(artifact = %out.display(), "script artifact already on disk");
      return Ok(BuildOutput::Single(out));
    }

    let config = &self.request.config;
    let include = if config.include.is_empty() {
      vec!["main".to_string()]
    } else {
      config.include.clone()
    };
    let optimizer_config = OptimizerConfig {
      base_url: self.ctx.workspace.resolution_base(&config.base_url),
      include,
      exclude: config.exclude.clone(),
      out: out.clone(),
      optimize: mode,
      skip_module_insertion: config.skip_module_insertion,
      preserve_license_comments: config.preserve_license_comments,
      extra: config.extra.clone(),
    };
    self.ctx.optimizer.optimize(&optimizer_config).await?;

    let ext = format!("{}.js", mode.name_infix());
    if let Err(err) = apply_filter(&self.ctx.filters, self.request.filter.as_deref(), &out, &ext).await {
      // An unfiltered artifact must not survive at the filtered fingerprint.
      let _ = tokio::fs::remove_file(&out).await;
      return Err(err);
    }

    tracing::info!(project = %self.request.project, artifact = %out.display(), "script bundle built");
    Ok(BuildOutput::Single(out))
  }
}
