use amdforge_utils::path_ext::strip_extension;

use crate::{BundleConfig, OptimizeMode, OutputKind, ProjectRef};

/// One caller request for a build: which project, which entry modules, what
/// artifact family, at which optimization level, through which filter.
#[derive(Debug, Clone)]
pub struct BuildRequest {
  pub project: ProjectRef,
  pub config: BundleConfig,
  /// Caller-visible bundle name. Determines the output kind and, for
  /// archives, the base name of every file inside the zip.
  pub bundle_name: Option<String>,
  pub optimize: bool,
  pub filter: Option<String>,
}

impl BuildRequest {
  pub fn new(project: ProjectRef, config: BundleConfig) -> Self {
    Self { project, config, bundle_name: None, optimize: false, filter: None }
  }

  pub fn with_bundle_name(mut self, name: impl Into<String>) -> Self {
    self.bundle_name = Some(name.into());
    self
  }

  pub fn with_optimize(mut self, optimize: bool) -> Self {
    self.optimize = optimize;
    self
  }

  pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
    self.filter = Some(filter.into());
    self
  }

  /// Effective bundle name; defaults to `<repo>.js`.
  pub fn output_name(&self) -> String {
    self.bundle_name.clone().unwrap_or_else(|| format!("{}.js", self.project.repo))
  }

  /// Base name used inside archives: the output name minus its extension.
  pub fn output_stem(&self) -> String {
    strip_extension(&self.output_name()).into_owned()
  }

  pub fn kind(&self) -> OutputKind {
    OutputKind::from_bundle_name(&self.output_name())
  }

  pub fn optimize_mode(&self) -> OptimizeMode {
    OptimizeMode::from_flag(self.optimize)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn output_name_defaults_to_repo() {
    let request = BuildRequest::new(
      ProjectRef::new("owner", "widgets", "main"),
      BundleConfig::default(),
    );
    assert_eq!(request.output_name(), "widgets.js");
    assert_eq!(request.kind(), OutputKind::Script);

    let request = request.with_bundle_name("widgets.zip");
    assert_eq!(request.kind(), OutputKind::Archive);
    assert_eq!(request.output_stem(), "widgets");
  }
}
