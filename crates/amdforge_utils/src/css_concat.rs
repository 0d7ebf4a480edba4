use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sugar_path::SugarPath;

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"@import\s+(?:url\(\s*)?["']?([^"'()\s;]+)["']?\s*\)?\s*[^;]*;"#).unwrap()
});

#[derive(Debug)]
pub struct CssConcatError {
  pub path: PathBuf,
  pub reason: String,
}

impl std::fmt::Display for CssConcatError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: {}", self.path.display(), self.reason)
  }
}

impl std::error::Error for CssConcatError {}

/// Reads a stylesheet and inlines its local `@import` statements, each
/// resolved against the importing file's directory. Remote imports
/// (`http://`, `https://`, `//`) are left untouched. A file is inlined at
/// most once per concatenation; a repeated import collapses to nothing.
pub fn concat_stylesheet(path: &Path) -> Result<String, CssConcatError> {
  let mut visited = Vec::new();
  concat_inner(path, &mut visited)
}

fn concat_inner(path: &Path, visited: &mut Vec<PathBuf>) -> Result<String, CssConcatError> {
  let canonical = path.absolutize();
  if visited.contains(&canonical) {
    return Ok(String::new());
  }
  visited.push(canonical);

  let source = std::fs::read_to_string(path)
    .map_err(|err| CssConcatError { path: path.to_path_buf(), reason: err.to_string() })?;
  let dir = path.parent().unwrap_or_else(|| Path::new("."));

  let mut out = String::with_capacity(source.len());
  let mut last = 0;
  for captures in IMPORT_RE.captures_iter(&source) {
    let whole = captures.get(0).unwrap();
    let target = &captures[1];
    if is_remote(target) {
      continue;
    }
    out.push_str(&source[last..whole.start()]);
    out.push_str(&concat_inner(&dir.join(target), visited)?);
    last = whole.end();
  }
  out.push_str(&source[last..]);

  Ok(out)
}

fn is_remote(target: &str) -> bool {
  target.starts_with("http://") || target.starts_with("https://") || target.starts_with("//")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
  }

  #[test]
  fn inlines_local_imports() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "base.css", ".base { color: red; }\n");
    let entry = write(dir.path(), "entry.css", "@import \"base.css\";\n.entry {}\n");

    let out = concat_stylesheet(&entry).unwrap();
    assert_eq!(out, ".base { color: red; }\n\n.entry {}\n");
  }

  #[test]
  fn leaves_remote_imports_alone() {
    let dir = tempfile::tempdir().unwrap();
    let entry =
      write(dir.path(), "entry.css", "@import url(https://cdn.example/x.css);\n.entry {}\n");

    let out = concat_stylesheet(&entry).unwrap();
    assert!(out.contains("https://cdn.example/x.css"));
  }

  #[test]
  fn repeated_import_is_inlined_once() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "base.css", ".base {}\n");
    let entry =
      write(dir.path(), "entry.css", "@import \"base.css\";\n@import \"base.css\";\n.entry {}\n");

    let out = concat_stylesheet(&entry).unwrap();
    assert_eq!(out.matches(".base").count(), 1);
  }

  #[test]
  fn missing_import_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let entry = write(dir.path(), "entry.css", "@import \"nope.css\";\n");

    let err = concat_stylesheet(&entry).unwrap_err();
    assert!(err.path.ends_with("nope.css"));
  }
}
