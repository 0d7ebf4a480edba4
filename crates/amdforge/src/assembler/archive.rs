use std::sync::Arc;

use amdforge_common::{BuildRequest, OptimizeMode, OutputKind};
use amdforge_error::{BuildError, BuildResult};

use crate::assembler::{artifact_exists, zip_pack, BuildContext, ScriptBuild, StyleBuild};
use crate::cache::{BuildCache, BuildOutput};

/// Assembles a distribution archive: the plain and minified script bundle
/// plus the plain and minified style bundles, zipped under the caller's
/// chosen base name.
///
/// Sub-builds go through the shared build cache under their own keys, so
/// the plain and minified variant of each kind is built once even while the
/// four run concurrently, and a repeated archive request reuses them all.
/// All four must succeed; the first sub-build failure fails the archive and
/// no zip is written.
pub(crate) struct ArchiveBuild {
  pub ctx: BuildContext,
  pub request: BuildRequest,
  pub digest: String,
  pub cache: Arc<BuildCache>,
}

impl ArchiveBuild {
  pub async fn run(self) -> BuildResult<BuildOutput> {
    let out = self.ctx.workspace.archive_path(&self.digest);
    if artifact_exists(&out).await {
      tracing::debug!(artifact = %out.display(), "archive already on disk");
      return Ok(BuildOutput::Single(out));
    }

    let (script, script_min, style, style_min) = futures::try_join!(
      self.sub_build(OutputKind::Script, false),
      self.sub_build(OutputKind::Script, true),
      self.sub_build(OutputKind::Style, false),
      self.sub_build(OutputKind::Style, true),
    )
    .map_err(|err| BuildError::PartialArchive(Box::new(err)))?;

    // Inside the zip the artifacts carry the caller-visible stem instead of
    // the digest; empty sub-results contribute no entries.
    let stem = self.request.output_stem();
    let mut entries = Vec::new();
    for output in [script, script_min, style, style_min] {
      for path in output.files() {
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        let Some(file_name) = file_name else { continue };
        entries.push((file_name.replacen(&self.digest, &stem, 1), path.clone()));
      }
    }

    // The zip writer is synchronous; pack off the async workers.
    let archive_path = out.clone();
    tokio::task::spawn_blocking(move || zip_pack::pack(&archive_path, &entries))
      .await
      .map_err(|err| BuildError::TaskJoin(err.to_string()))??;
    tracing::info!(project = %self.request.project, artifact = %out.display(), "archive built");
    Ok(BuildOutput::Single(out))
  }

  async fn sub_build(&self, kind: OutputKind, minify: bool) -> BuildResult<BuildOutput> {
    let request = self.request.clone().with_optimize(minify);
    let key = format!("{}{}", self.digest, OptimizeMode::from_flag(minify).name_infix());
    let ctx = self.ctx.clone();
    let digest = self.digest.clone();
    self
      .cache
      .get_or_create(kind, key, self.ctx.workspace.root(), move || match kind {
        OutputKind::Script => Box::pin(ScriptBuild { ctx, request, digest }.run()),
        OutputKind::Style => Box::pin(StyleBuild { ctx, request, digest }.run()),
        OutputKind::Archive => unreachable!("archives never nest"),
      })
      .await
  }
}
