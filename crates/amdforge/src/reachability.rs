use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use amdforge_common::{DependencyGraph, MetaValue, DEFAULT_GROUP};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use sugar_path::SugarPath;

/// Collects the resource lists annotated under `meta_key` across every
/// module reachable from `entries`, keyed by group name.
///
/// Traversal is depth-first from the entries in their given order; a module
/// is visited once even through dependency cycles, and excluded modules are
/// cut out together with anything only reachable through them. Plain
/// annotation values land in the implicit default group, namespaced values
/// in their named group. Within a group, first-reached order is kept and
/// duplicates collapse.
pub fn collect_resources_by_group(
  graph: &DependencyGraph,
  entries: &[String],
  exclude: &[String],
  meta_key: &str,
) -> BTreeMap<String, IndexSet<String>> {
  let excluded: FxHashSet<&str> = exclude.iter().map(String::as_str).collect();
  let mut groups: BTreeMap<String, IndexSet<String>> = BTreeMap::new();
  let mut visited: FxHashSet<&str> = FxHashSet::default();
  let mut stack: Vec<&str> = Vec::new();

  let roots: Vec<&str> = if entries.is_empty() {
    graph.keys().map(String::as_str).collect()
  } else {
    entries.iter().map(String::as_str).collect()
  };

  for root in roots {
    if excluded.contains(root) || !visited.insert(root) {
      continue;
    }
    stack.push(root);
    while let Some(module) = stack.pop() {
      let Some(record) = graph.get(module) else {
        // Bare ids (loader paths, externals) carry no annotations.
        continue;
      };

      match record.meta.get(meta_key) {
        Some(MetaValue::Plain(list)) => {
          extend_group(&mut groups, DEFAULT_GROUP, list);
        }
        Some(MetaValue::Grouped(by_group)) => {
          for (group, list) in by_group {
            extend_group(&mut groups, group, list);
          }
        }
        None => {}
      }

      // Reverse keeps the declared dependency order across the stack.
      for dep in record.deps.iter().rev() {
        if !excluded.contains(dep.as_str()) && visited.insert(dep) {
          stack.push(dep);
        }
      }
    }
  }

  groups
}

fn extend_group(groups: &mut BTreeMap<String, IndexSet<String>>, group: &str, list: &str) {
  let entries = groups.entry(group.to_string()).or_default();
  for item in list.split(',') {
    let item = item.trim();
    if !item.is_empty() {
      entries.insert(item.to_string());
    }
  }
}

/// Resolves a group's resource paths against the absolute resolution base.
pub fn resolve_group_files(base: &Path, files: &IndexSet<String>) -> Vec<PathBuf> {
  files.iter().map(|file| base.join(file).normalize()).collect()
}

#[cfg(test)]
mod tests {
  use amdforge_common::ModuleRecord;

  use super::*;

  fn module(deps: &[&str], css: Option<MetaValue>) -> ModuleRecord {
    let mut record = ModuleRecord::with_deps(deps.iter().map(|d| d.to_string()).collect());
    if let Some(css) = css {
      record.meta.insert("css".to_string(), css);
    }
    record
  }

  fn plain(list: &str) -> MetaValue {
    MetaValue::Plain(list.to_string())
  }

  #[test]
  fn collects_transitively_in_declaration_order() {
    let mut graph = DependencyGraph::new();
    graph.insert("main".into(), module(&["widget", "theme"], None));
    graph.insert("widget".into(), module(&[], Some(plain("widget.css"))));
    graph.insert("theme".into(), module(&[], Some(plain("theme.css"))));

    let groups = collect_resources_by_group(&graph, &["main".into()], &[], "css");
    let default: Vec<&str> = groups[DEFAULT_GROUP].iter().map(String::as_str).collect();
    assert_eq!(default, vec!["widget.css", "theme.css"]);
  }

  #[test]
  fn cycles_terminate_and_duplicates_collapse() {
    let mut graph = DependencyGraph::new();
    graph.insert("a".into(), module(&["b"], Some(plain("shared.css"))));
    graph.insert("b".into(), module(&["a"], Some(plain("shared.css,b.css"))));

    let groups = collect_resources_by_group(&graph, &["a".into()], &[], "css");
    let default: Vec<&str> = groups[DEFAULT_GROUP].iter().map(String::as_str).collect();
    assert_eq!(default, vec!["shared.css", "b.css"]);
  }

  #[test]
  fn exclusions_cut_whole_subtrees() {
    let mut graph = DependencyGraph::new();
    graph.insert("main".into(), module(&["heavy"], Some(plain("main.css"))));
    graph.insert("heavy".into(), module(&["inner"], Some(plain("heavy.css"))));
    graph.insert("inner".into(), module(&[], Some(plain("inner.css"))));

    let groups =
      collect_resources_by_group(&graph, &["main".into()], &["heavy".into()], "css");
    let default: Vec<&str> = groups[DEFAULT_GROUP].iter().map(String::as_str).collect();
    assert_eq!(default, vec!["main.css"]);
  }

  #[test]
  fn namespaced_annotations_form_named_groups() {
    let mut graph = DependencyGraph::new();
    graph.insert(
      "widget".into(),
      module(
        &[],
        Some(MetaValue::Grouped(BTreeMap::from([
          ("ios".to_string(), "widget.ios.css".to_string()),
          ("android".to_string(), "widget.android.css".to_string()),
        ]))),
      ),
    );

    let groups = collect_resources_by_group(&graph, &["widget".into()], &[], "css");
    assert!(!groups.contains_key(DEFAULT_GROUP));
    assert_eq!(groups["ios"].iter().next().unwrap(), "widget.ios.css");
    assert_eq!(groups["android"].iter().next().unwrap(), "widget.android.css");
  }

  #[test]
  fn unknown_entries_yield_nothing() {
    let graph = DependencyGraph::new();
    let groups = collect_resources_by_group(&graph, &["ghost".into()], &[], "css");
    assert!(groups.is_empty());
  }
}
