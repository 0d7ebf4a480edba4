use std::collections::BTreeMap;

use serde::Serialize;

/// The normalized declarative build configuration.
///
/// Entry and exclusion lists are sorted and deduplicated so that two
/// logically identical requests serialize identically; `extra` carries
/// arbitrary pass-through optimizer options (pragmas and the like) in a
/// sorted map for the same reason. The serialized form is the canonical
/// fingerprint input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
  pub include: Vec<String>,
  pub exclude: Vec<String>,
  pub base_url: String,
  pub skip_module_insertion: bool,
  pub preserve_license_comments: bool,
  #[serde(flatten)]
  pub extra: BTreeMap<String, serde_json::Value>,
}

impl BundleConfig {
  pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
    Self {
      include: normalize_modules(include),
      exclude: normalize_modules(exclude),
      base_url: ".".to_string(),
      skip_module_insertion: false,
      preserve_license_comments: true,
      extra: BTreeMap::default(),
    }
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
    self.extra.insert(key.into(), value);
    self
  }

  /// Canonical JSON used as fingerprint input. Serialization of this struct
  /// cannot fail: every field is a string, bool, or JSON value.
  pub fn canonical_json(&self) -> String {
    serde_json::to_string(self).unwrap_or_default()
  }
}

impl Default for BundleConfig {
  fn default() -> Self {
    Self::new(vec!["main".to_string()], Vec::new())
  }
}

fn normalize_modules(mut modules: Vec<String>) -> Vec<String> {
  modules.retain(|name| !name.is_empty());
  modules.sort_unstable();
  modules.dedup();
  modules
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn include_order_does_not_matter() {
    let a = BundleConfig::new(vec!["widget".into(), "main".into()], vec![]);
    let b = BundleConfig::new(vec!["main".into(), "widget".into(), "main".into()], vec![]);
    assert_eq!(a.canonical_json(), b.canonical_json());
  }

  #[test]
  fn canonical_json_is_stable_over_extra_options() {
    let a = BundleConfig::default()
      .with_extra("paths", serde_json::json!({"jquery": "empty:"}))
      .with_extra("generateSourceMaps", serde_json::json!(false));
    let b = BundleConfig::default()
      .with_extra("generateSourceMaps", serde_json::json!(false))
      .with_extra("paths", serde_json::json!({"jquery": "empty:"}));
    assert_eq!(a.canonical_json(), b.canonical_json());
  }
}
