use std::path::Path;

use amdforge_common::{Optimizer, OptimizerConfig, StyleOptimizeConfig};
use amdforge_error::{BuildError, BuildResult};
use rustc_hash::FxHashSet;

use crate::graph::extract_dependencies;

/// The built-in bundling engine: dependency-ordered concatenation with an
/// optional comment-stripping minify pass.
///
/// It traces the module graph the same way the graph builder does, emits
/// each module exactly once with its dependencies first, and shims modules
/// that never call `define` unless module insertion is skipped. It is the
/// baseline engine the service runs with when no external one is plugged in.
pub struct CatOptimizer;

impl CatOptimizer {
  pub fn new() -> Self {
    Self
  }
}

impl Default for CatOptimizer {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait::async_trait]
impl Optimizer for CatOptimizer {
  async fn optimize(&self, config: &OptimizerConfig) -> BuildResult<()> {
    // Tracing recurses through the module tree with blocking reads.
    let traced = config.clone();
    let mut bundle = tokio::task::spawn_blocking(move || concatenate(&traced))
      .await
      .map_err(|err| BuildError::TaskJoin(err.to_string()))??;
    if config.optimize.is_minify() {
      bundle = strip_script_comments(&bundle, config.preserve_license_comments);
      bundle = collapse_blank_lines(&bundle);
    }
    write_artifact(&config.out, &bundle).await
  }

  async fn optimize_style(&self, config: &StyleOptimizeConfig) -> BuildResult<()> {
    let css = tokio::fs::read_to_string(&config.css_in)
      .await
      .map_err(|err| BuildError::concatenation(&config.css_in, err))?;
    let out = match config.optimize_css.as_str() {
      "standard" => collapse_css_whitespace(&strip_css_comments(&css)),
      "standard.keepLines" => strip_css_comments(&css),
      "none" => css,
      other => {
        return Err(BuildError::OptimizerFailure(format!(
          "unsupported optimizeCss token '{other}'"
        )));
      }
    };
    write_artifact(&config.out, &out).await
  }
}

/// Emits every module reachable from the include list, dependencies first,
/// each exactly once. Transitive ids with no file under the base are taken
/// to be loader-provided and skipped; missing include entries are errors.
fn concatenate(config: &OptimizerConfig) -> BuildResult<String> {
  let excluded: FxHashSet<&str> = config.exclude.iter().map(String::as_str).collect();
  let mut emitted: FxHashSet<String> = FxHashSet::default();
  let mut pieces: Vec<String> = Vec::new();

  for entry in &config.include {
    if excluded.contains(entry.as_str()) {
      continue;
    }
    emit_module(config, entry, true, &excluded, &mut emitted, &mut pieces)?;
  }

  Ok(pieces.join("\n"))
}

fn emit_module(
  config: &OptimizerConfig,
  id: &str,
  required: bool,
  excluded: &FxHashSet<&str>,
  emitted: &mut FxHashSet<String>,
  pieces: &mut Vec<String>,
) -> BuildResult<()> {
  if !emitted.insert(id.to_string()) {
    return Ok(());
  }

  let path = config.base_url.join(format!("{id}.js"));
  let source = match std::fs::read_to_string(&path) {
    Ok(source) => source,
    Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
    Err(err) => return Err(BuildError::module_read(id, err)),
  };
  let deps =
    extract_dependencies(id, &source).map_err(|reason| BuildError::module_parse(id, reason))?;

  for dep in &deps {
    if !excluded.contains(dep.as_str()) {
      emit_module(config, dep, false, excluded, emitted, pieces)?;
    }
  }

  pieces.push(source.trim_end().to_string());
  if !config.skip_module_insertion && !source.contains("define(") {
    pieces.push(format!("define(\"{id}\", function () {{}});"));
  }
  Ok(())
}

async fn write_artifact(out: &Path, content: &str) -> BuildResult<()> {
  if let Some(parent) = out.parent() {
    tokio::fs::create_dir_all(parent).await.map_err(|err| BuildError::persist(parent, err))?;
  }
  tokio::fs::write(out, content).await.map_err(|err| BuildError::persist(out, err))
}

/// Removes `//` and `/* */` comments, keeping string literals intact and,
/// when asked, `/*!` license banners.
fn strip_script_comments(source: &str, preserve_license: bool) -> String {
  let bytes = source.as_bytes();
  let mut out = String::with_capacity(source.len());
  let mut kept_from = 0;
  let mut i = 0;

  while i < bytes.len() {
    match bytes[i] {
      // String literals are copied verbatim, comment markers inside them
      // included.
      quote @ (b'"' | b'\'' | b'`') => {
        i += 1;
        while i < bytes.len() {
          if bytes[i] == b'\\' {
            i += 2;
          } else if bytes[i] == quote {
            i += 1;
            break;
          } else {
            i += 1;
          }
        }
      }
      b'/' if bytes.get(i + 1) == Some(&b'/') => {
        out.push_str(&source[kept_from..i]);
        while i < bytes.len() && bytes[i] != b'\n' {
          i += 1;
        }
        kept_from = i;
      }
      b'/' if bytes.get(i + 1) == Some(&b'*') => {
        let licensed = preserve_license && bytes.get(i + 2) == Some(&b'!');
        let end = source[i + 2..].find("*/").map(|at| i + 2 + at + 2).unwrap_or(bytes.len());
        if !licensed {
          out.push_str(&source[kept_from..i]);
          kept_from = end;
        }
        i = end;
      }
      _ => {
        i += 1;
      }
    }
  }
  out.push_str(&source[kept_from.min(source.len())..]);

  out
}

fn collapse_blank_lines(source: &str) -> String {
  let mut out = String::with_capacity(source.len());
  let mut blank_run = false;
  for line in source.lines() {
    let trimmed = line.trim_end();
    if trimmed.trim_start().is_empty() {
      blank_run = true;
      continue;
    }
    if blank_run && !out.is_empty() {
      out.push('\n');
    }
    blank_run = false;
    out.push_str(trimmed);
    out.push('\n');
  }
  out
}

fn strip_css_comments(css: &str) -> String {
  let mut out = String::with_capacity(css.len());
  let mut rest = css;
  while let Some(start) = rest.find("/*") {
    out.push_str(&rest[..start]);
    match rest[start + 2..].find("*/") {
      Some(end) => rest = &rest[start + 2 + end + 2..],
      None => return out,
    }
  }
  out.push_str(rest);
  out
}

fn collapse_css_whitespace(css: &str) -> String {
  let mut out = String::with_capacity(css.len());
  let mut pending_space = false;
  for c in css.chars() {
    if c.is_whitespace() {
      pending_space = true;
      continue;
    }
    let after_break = matches!(out.chars().last(), None | Some('{' | '}' | ';' | ':' | ','));
    if pending_space && !after_break && !matches!(c, '{' | '}' | ';' | ':' | ',') {
      out.push(' ');
    }
    pending_space = false;
    out.push(c);
  }
  out
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;
  use std::path::PathBuf;

  use amdforge_common::OptimizeMode;

  use super::*;

  fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, source) in files {
      let path = dir.path().join(name);
      std::fs::create_dir_all(path.parent().unwrap()).unwrap();
      std::fs::write(path, source).unwrap();
    }
    dir
  }

  fn config(dir: &Path, include: Vec<String>, optimize: OptimizeMode) -> OptimizerConfig {
    OptimizerConfig {
      base_url: dir.to_path_buf(),
      include,
      exclude: vec![],
      out: dir.join("__compiled/out.js"),
      optimize,
      skip_module_insertion: false,
      preserve_license_comments: true,
      extra: BTreeMap::new(),
    }
  }

  #[tokio::test]
  async fn emits_dependencies_before_dependents() {
    let dir = project(&[
      ("main.js", r#"define(["./lib/a"], function (a) { return a; });"#),
      ("lib/a.js", r#"define([], function () { return 1; });"#),
    ]);
    let config = config(dir.path(), vec!["main".into()], OptimizeMode::None);
    CatOptimizer::new().optimize(&config).await.unwrap();

    let out = std::fs::read_to_string(&config.out).unwrap();
    let a_at = out.find("return 1").unwrap();
    let main_at = out.find("return a").unwrap();
    assert!(a_at < main_at);
  }

  #[tokio::test]
  async fn each_module_appears_once() {
    let dir = project(&[
      ("main.js", r#"define(["./a", "./b"], f);"#),
      ("a.js", r#"define(["./b"], f); // uses b"#),
      ("b.js", r#"define([], function () { return "b-body"; });"#),
    ]);
    let config = config(dir.path(), vec!["main".into()], OptimizeMode::None);
    CatOptimizer::new().optimize(&config).await.unwrap();

    let out = std::fs::read_to_string(&config.out).unwrap();
    assert_eq!(out.matches("b-body").count(), 1);
  }

  #[tokio::test]
  async fn excluded_modules_are_left_out() {
    let dir = project(&[
      ("main.js", r#"define(["./vendor"], f);"#),
      ("vendor.js", "var vendor = \"vendor-body\";"),
    ]);
    let mut config = config(dir.path(), vec!["main".into()], OptimizeMode::None);
    config.exclude = vec!["vendor".into()];
    CatOptimizer::new().optimize(&config).await.unwrap();

    let out = std::fs::read_to_string(&config.out).unwrap();
    assert!(!out.contains("vendor-body"));
  }

  #[tokio::test]
  async fn minify_strips_comments_but_keeps_license_banners() {
    let dir = project(&[(
      "main.js",
      "/*! Copyright 2013 */\n// internal note\ndefine([], function () {\n  var url = \"http://x\";\n\n  return url; /* inline */\n});\n",
    )]);
    let config = config(dir.path(), vec!["main".into()], OptimizeMode::Uglify);
    CatOptimizer::new().optimize(&config).await.unwrap();

    let out = std::fs::read_to_string(&config.out).unwrap();
    assert!(out.contains("/*! Copyright 2013 */"));
    assert!(out.contains("http://x"));
    assert!(!out.contains("internal note"));
    assert!(!out.contains("inline"));
  }

  #[tokio::test]
  async fn non_amd_modules_get_a_define_shim() {
    let dir = project(&[("legacy.js", "var legacy = 1;")]);
    let config = config(dir.path(), vec!["legacy".into()], OptimizeMode::None);
    CatOptimizer::new().optimize(&config).await.unwrap();

    let out = std::fs::read_to_string(&config.out).unwrap();
    assert!(out.contains("define(\"legacy\""));
  }

  #[tokio::test]
  async fn style_standard_strips_comments_and_whitespace() {
    let dir = tempfile::tempdir().unwrap();
    let css_in = dir.path().join("in.css");
    std::fs::write(&css_in, "/* banner */\n.a {\n  color: red;\n}\n").unwrap();
    let out = dir.path().join("out.css");

    CatOptimizer::new()
      .optimize_style(&StyleOptimizeConfig::standard(css_in, out.clone()))
      .await
      .unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), ".a{color:red;}");
  }

  #[tokio::test]
  async fn style_keep_lines_only_drops_comments() {
    let dir = tempfile::tempdir().unwrap();
    let css_in = dir.path().join("in.css");
    std::fs::write(&css_in, ".a { color: red; } /* note */\n.b { top: 0; }\n").unwrap();
    let out = dir.path().join("out.css");

    let config = StyleOptimizeConfig {
      css_in,
      out: out.clone(),
      optimize_css: "standard.keepLines".to_string(),
    };
    CatOptimizer::new().optimize_style(&config).await.unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains(".a { color: red; } \n.b { top: 0; }"));
    assert!(!written.contains("note"));
  }

  #[tokio::test]
  async fn missing_entry_module_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), vec!["ghost".into()], OptimizeMode::None);
    let err = CatOptimizer::new().optimize(&config).await.unwrap_err();
    assert!(matches!(err, BuildError::ModuleRead { module, .. } if module == "ghost"));
  }

  #[test]
  fn css_collapse_preserves_selector_spaces() {
    let css = ".nav li a { color : red ; }";
    assert_eq!(collapse_css_whitespace(css), ".nav li a{color:red;}");
  }
}
