use std::sync::Arc;

use amdforge_common::BundleFilter;
use amdforge_error::{BuildError, BuildResult};
use dashmap::DashMap;

/// Named post-processing transforms, registered at startup and looked up by
/// the identifier a request carries. Identifiers are restricted to a flat
/// token alphabet so they can never be abused as filesystem paths.
pub struct FilterRegistry {
  filters: DashMap<String, Arc<dyn BundleFilter>>,
}

impl FilterRegistry {
  pub fn new() -> Self {
    Self { filters: DashMap::new() }
  }

  /// Registers `filter` under `id`, replacing any previous registration.
  pub fn register(
    &self,
    id: impl Into<String>,
    filter: Arc<dyn BundleFilter>,
  ) -> BuildResult<()> {
    let id = id.into();
    if !is_valid_id(&id) {
      return Err(BuildError::Filter {
        filter: id,
        reason: "identifier must be non-empty and use only [A-Za-z0-9._-]".to_string(),
      });
    }
    self.filters.insert(id, filter);
    Ok(())
  }

  /// Applies the filter named by `id` to `content`. `None` passes the
  /// content through untouched; an unregistered id is an error.
  pub fn apply(&self, id: Option<&str>, content: String, ext: &str) -> BuildResult<String> {
    let Some(id) = id else {
      return Ok(content);
    };
    let Some(filter) = self.filters.get(id).map(|entry| Arc::clone(entry.value())) else {
      return Err(BuildError::Filter {
        filter: id.to_string(),
        reason: "no such filter registered".to_string(),
      });
    };
    filter
      .apply(content, ext)
      .map_err(|reason| BuildError::Filter { filter: id.to_string(), reason })
  }
}

impl Default for FilterRegistry {
  fn default() -> Self {
    Self::new()
  }
}

fn is_valid_id(id: &str) -> bool {
  !id.is_empty()
    && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
