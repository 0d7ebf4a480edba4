use std::fmt::Display;
use std::path::Path;

/// The artifact family a build request asks for, derived from the extension
/// of the requested bundle name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
  Script,
  Style,
  Archive,
}

impl OutputKind {
  pub fn from_bundle_name(name: &str) -> Self {
    match Path::new(name).extension().and_then(|ext| ext.to_str()) {
      Some("css") => Self::Style,
      Some("zip") => Self::Archive,
      _ => Self::Script,
    }
  }

  /// The MIME type folded into the build fingerprint. Distinct per kind so
  /// two kinds over the same configuration never share a digest.
  pub fn mime_type(self) -> &'static str {
    match self {
      Self::Script => "application/javascript",
      Self::Style => "text/css",
      Self::Archive => "application/zip",
    }
  }

  pub fn needs_dependency_graph(self) -> bool {
    matches!(self, Self::Style | Self::Archive)
  }
}

impl Display for OutputKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Script => write!(f, "script"),
      Self::Style => write!(f, "style"),
      Self::Archive => write!(f, "archive"),
    }
  }
}
