use std::io::Write;
use std::path::{Path, PathBuf};

use amdforge_error::{BuildError, BuildResult};
use zip::write::SimpleFileOptions;

/// Writes `entries` into a deflate-compressed zip at `out`. Entry names are
/// taken as given; sources are read from disk at pack time. Blocking, so
/// callers run it on the blocking pool.
pub(crate) fn pack(out: &Path, entries: &[(String, PathBuf)]) -> BuildResult<()> {
  if let Some(parent) = out.parent() {
    std::fs::create_dir_all(parent).map_err(|err| BuildError::persist(parent, err))?;
  }
  let file = std::fs::File::create(out).map_err(|err| BuildError::persist(out, err))?;
  let mut zip = zip::ZipWriter::new(file);
  let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

  for (name, source) in entries {
    zip.start_file(name.as_str(), options).map_err(|err| BuildError::persist(out, err))?;
    let bytes = std::fs::read(source).map_err(|err| BuildError::persist(source, err))?;
    zip.write_all(&bytes).map_err(|err| BuildError::persist(out, err))?;
  }
  zip.finish().map_err(|err| BuildError::persist(out, err))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn packs_entries_under_their_given_names() {
    let dir = tempfile::tempdir().unwrap();
    let js = dir.path().join("abc123.js");
    std::fs::write(&js, "define([], f);").unwrap();
    let css = dir.path().join("abc123.css");
    std::fs::write(&css, ".a {}").unwrap();

    let out = dir.path().join("bundle.zip");
    pack(&out, &[("widgets.js".to_string(), js), ("widgets.css".to_string(), css)]).unwrap();

    let mut archive = zip::ZipArchive::new(std::fs::File::open(&out).unwrap()).unwrap();
    let names: Vec<String> = (0..archive.len())
      .map(|i| archive.by_index(i).unwrap().name().to_string())
      .collect();
    assert_eq!(names, vec!["widgets.js", "widgets.css"]);
  }
}
