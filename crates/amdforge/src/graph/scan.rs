use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use amdforge_common::MetaValue;
use regex::Regex;
use sugar_path::SugarPath;

/// Start of an AMD dependency array: `define(` or `require(`, optionally
/// preceded by a module-id string argument.
static DEPS_START_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"\b(?:define|require)\s*\(\s*(?:["'][^"']*["']\s*,\s*)?\["#).unwrap()
});

/// Single-line annotation comment: `//>> key: value`.
static ANNOTATION_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"//>>\s*([^:]+):(.*)$").unwrap());

/// Pseudo-dependencies the AMD loader provides; never files on disk.
const PSEUDO_DEPS: [&str; 3] = ["require", "exports", "module"];

/// Statically extracts the dependency ids declared by `source`.
///
/// Relative ids are resolved against the importing module's directory and
/// re-expressed relative to the resolution base root; bare ids pass through
/// untouched. Loader-plugin ids (`text!...`) and pseudo-dependencies are
/// skipped. Returns `Err` with a human-readable reason on malformed input;
/// the caller owns wrapping it into the error taxonomy.
pub fn extract_dependencies(module_id: &str, source: &str) -> Result<Vec<String>, String> {
  let mut deps = Vec::new();

  for found in DEPS_START_RE.find_iter(source) {
    let rest = &source[found.end()..];
    let Some(close) = rest.find(']') else {
      return Err(format!(
        "unterminated dependency array at byte {} of '{module_id}'",
        found.start()
      ));
    };

    for item in rest[..close].split(',') {
      let item = item.trim();
      let Some(name) = unquote(item) else {
        // Not a string literal (a variable, or trailing whitespace).
        continue;
      };
      if name.is_empty() || name.contains('!') || PSEUDO_DEPS.contains(&name) {
        continue;
      }
      let resolved = resolve_dependency(module_id, name);
      if !deps.contains(&resolved) {
        deps.push(resolved);
      }
    }
  }

  Ok(deps)
}

/// Resolves one declared dependency id to a canonical, base-relative id.
fn resolve_dependency(module_id: &str, dep: &str) -> String {
  if !dep.starts_with("./") && !dep.starts_with("../") {
    return dep.to_string();
  }
  let dir = Path::new(module_id).parent().unwrap_or_else(|| Path::new(""));
  let joined = dir.join(dep).normalize();
  match joined.to_slash() {
    Some(slashed) => slashed.into_owned(),
    None => joined.to_string_lossy().into_owned(),
  }
}

fn unquote(item: &str) -> Option<&str> {
  let stripped = item
    .strip_prefix('"')
    .and_then(|rest| rest.strip_suffix('"'))
    .or_else(|| item.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')))?;
  Some(stripped)
}

/// Extracts `//>> key: value` annotation comments from `source`.
///
/// A dotted key is split into a namespace and a sub-key and folded into a
/// grouped mapping (`css.ios: a.css` lands under `css` / `ios`). Later
/// occurrences of the same key win, matching a last-write scan of the file.
pub fn extract_annotations(source: &str) -> BTreeMap<String, MetaValue> {
  let mut meta: BTreeMap<String, MetaValue> = BTreeMap::new();

  for line in source.lines() {
    let Some(captures) = ANNOTATION_RE.captures(line) else {
      continue;
    };
    let key = captures[1].trim().to_string();
    let value = captures[2].trim().to_string();

    match key.find('.') {
      Some(dot) if dot > 0 => {
        let namespace = key[..dot].to_string();
        let sub_key = key[dot + 1..].to_string();
        // A namespaced key never displaces an earlier plain value for the
        // same namespace.
        match meta.entry(namespace).or_insert_with(|| MetaValue::Grouped(BTreeMap::new())) {
          MetaValue::Grouped(group) => {
            group.insert(sub_key, value);
          }
          MetaValue::Plain(_) => {}
        }
      }
      _ => {
        meta.insert(key, MetaValue::Plain(value));
      }
    }
  }

  meta
}
