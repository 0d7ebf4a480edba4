use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the implicit resource group a plain (non-namespaced) resource
/// annotation contributes to.
pub const DEFAULT_GROUP: &str = "default";

/// Annotation namespace that associates stylesheet files with a module.
pub const STYLE_META_KEY: &str = "css";

/// A metadata annotation value attached to a module.
///
/// Annotations carrying a dotted key (`css.ios: a.css,b.css`) are folded into
/// a [`MetaValue::Grouped`] mapping under the namespace before the dot; plain
/// keys stay [`MetaValue::Plain`]. The untagged representation keeps the
/// persisted graph file shape-compatible with the annotation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
  Plain(String),
  Grouped(BTreeMap<String, String>),
}

/// One module's record in the dependency graph: its resolved dependency ids
/// plus all annotation metadata found in its source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
  pub deps: Vec<String>,
  #[serde(flatten)]
  pub meta: BTreeMap<String, MetaValue>,
}

impl ModuleRecord {
  pub fn with_deps(deps: Vec<String>) -> Self {
    Self { deps, meta: BTreeMap::default() }
  }
}

/// The full graph for one module-set digest. `BTreeMap` keeps serialization
/// deterministic, so the persisted cache file round-trips bit-for-bit.
pub type DependencyGraph = BTreeMap<String, ModuleRecord>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn meta_value_round_trips_untagged() {
    let mut meta = BTreeMap::new();
    meta.insert("css".to_string(), MetaValue::Plain("widget.css,theme.css".to_string()));
    meta.insert(
      "label".to_string(),
      MetaValue::Grouped(BTreeMap::from([("en".to_string(), "Widget".to_string())])),
    );
    let record = ModuleRecord { deps: vec!["lib/base".to_string()], meta };

    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains(r#""css":"widget.css,theme.css""#));
    assert!(json.contains(r#""label":{"en":"Widget"}"#));

    let back: ModuleRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
  }
}
