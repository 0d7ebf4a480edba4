use amdforge_common::{BuildRequest, StyleOptimizeConfig, STYLE_META_KEY};
use amdforge_error::{BuildError, BuildResult};
use amdforge_utils::css_concat::concat_stylesheet;

use crate::assembler::{apply_filter, artifact_exists, BuildContext};
use crate::cache::BuildOutput;
use crate::reachability::{collect_resources_by_group, resolve_group_files};

/// Assembles the style bundles for a request: one artifact per stylesheet
/// group annotated on any module reachable from the entries.
///
/// Groups whose stylesheets are all empty produce no artifact at all, so a
/// platform group that only exists in annotations never ships an empty file.
pub(crate) struct StyleBuild {
  pub ctx: BuildContext,
  pub request: BuildRequest,
  pub digest: String,
}

impl StyleBuild {
  pub async fn run(self) -> BuildResult<BuildOutput> {
    let mode = self.request.optimize_mode();
    let config = &self.request.config;

    // The graph must cover the whole workspace: reachability starts at the
    // entry modules but annotation records of transitive dependencies live
    // on the dependencies themselves.
    let graph = self.ctx.graphs.build_map(&self.ctx.workspace, &config.base_url, &[]).await?;
    let groups =
      collect_resources_by_group(&graph, &config.include, &config.exclude, STYLE_META_KEY);
    if groups.is_empty() {
      return Ok(BuildOutput::Many(Vec::new()));
    }

    let base = self.ctx.workspace.resolution_base(&config.base_url);
    let compiled = self.ctx.workspace.compiled_dir();
    tokio::fs::create_dir_all(&compiled)
      .await
      .map_err(|err| BuildError::persist(&compiled, err))?;

    let ext = format!("{}.css", mode.name_infix());
    let mut outputs = Vec::new();
    for (group, files) in &groups {
      let out = self.ctx.workspace.style_path(&self.digest, group, mode);
      if artifact_exists(&out).await {
        outputs.push(out);
        continue;
      }

      // Stylesheet inlining walks @import chains on disk, so it runs off
      // the async workers.
      let group_files = resolve_group_files(&base, files);
      let concatenated = tokio::task::spawn_blocking(move || -> BuildResult<String> {
        let mut concatenated = String::new();
        for file in group_files {
          let piece = concat_stylesheet(&file)
            .map_err(|err| BuildError::concatenation(err.path.clone(), err.reason))?;
          concatenated.push_str(&piece);
          if !concatenated.ends_with('\n') {
            concatenated.push('\n');
          }
        }
        Ok(concatenated)
      })
      .await
      .map_err(|err| BuildError::TaskJoin(err.to_string()))??;
      if concatenated.trim().is_empty() {
        tracing::debug!(group, "style group is empty, no artifact");
        continue;
      }

      // The plain and minified passes of one archive run concurrently over
      // the same digest, so the staging name must carry the mode infix.
      let css_in =
        compiled.join(format!("{}.{group}{}.cssin", self.digest, mode.name_infix()));
      tokio::fs::write(&css_in, &concatenated)
        .await
        .map_err(|err| BuildError::persist(&css_in, err))?;
      let optimize_css =
        if mode.is_minify() { "standard" } else { "standard.keepLines" }.to_string();
      let style_config =
        StyleOptimizeConfig { css_in: css_in.clone(), out: out.clone(), optimize_css };
      let optimized = self.ctx.optimizer.optimize_style(&style_config).await;
      let _ = tokio::fs::remove_file(&css_in).await;
      optimized?;

      if let Err(err) =
        apply_filter(&self.ctx.filters, self.request.filter.as_deref(), &out, &ext).await
      {
        let _ = tokio::fs::remove_file(&out).await;
        return Err(err);
      }
      outputs.push(out);
    }

    tracing::info!(
      project = %self.request.project,
      artifacts = outputs.len(),
      "style bundles built"
    );
    Ok(BuildOutput::Many(outputs))
  }
}
