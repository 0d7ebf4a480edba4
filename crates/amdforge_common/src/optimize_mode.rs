use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Optimization level requested for a bundle. The token values are what the
/// optimizer receives in its declarative config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeMode {
  #[default]
  None,
  Uglify,
}

impl OptimizeMode {
  pub fn from_flag(optimize: bool) -> Self {
    if optimize {
      Self::Uglify
    } else {
      Self::None
    }
  }

  pub fn is_minify(self) -> bool {
    matches!(self, Self::Uglify)
  }

  /// `".min"` infix carried by minified artifact names, empty otherwise.
  pub fn name_infix(self) -> &'static str {
    if self.is_minify() {
      ".min"
    } else {
      ""
    }
  }

  pub fn token(self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Uglify => "uglify",
    }
  }
}

impl Display for OptimizeMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.token())
  }
}
