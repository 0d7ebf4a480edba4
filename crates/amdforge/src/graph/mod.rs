use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use amdforge_common::{DependencyGraph, ModuleRecord, WorkspaceLayout, COMPILED_DIR_NAME};
use amdforge_error::{BuildError, BuildResult};
use amdforge_utils::xxhash::xxhash_hex;
use sugar_path::SugarPath;
use walkdir::WalkDir;

use crate::cache::SharedTable;

mod scan;

pub(crate) use scan::{extract_annotations, extract_dependencies};

/// Builds dependency graphs for module sets and persists them under the
/// workspace's compiled directory as `deps-<digest>.json`.
///
/// The persisted file is the durable cache; the in-memory table only
/// deduplicates concurrent computations of the same digest and is emptied
/// again once each computation settles.
pub struct GraphBuilder {
  in_flight: SharedTable<String, Arc<DependencyGraph>>,
  computations: Arc<AtomicU64>,
}

impl GraphBuilder {
  pub fn new() -> Self {
    Self { in_flight: SharedTable::new(), computations: Arc::new(AtomicU64::new(0)) }
  }

  /// Returns the graph for the given module set, scanning sources only when
  /// no persisted graph for the set's digest exists yet.
  ///
  /// An empty `include` means the whole workspace: every `.js` file under
  /// the resolution base participates.
  pub async fn build_map(
    &self,
    workspace: &WorkspaceLayout,
    base_url: &str,
    include: &[String],
  ) -> BuildResult<Arc<DependencyGraph>> {
    let base = workspace.resolution_base(base_url);
    let modules = if include.is_empty() {
      enumerate_modules(&base)?
    } else {
      let mut modules = include.to_vec();
      modules.sort_unstable();
      modules.dedup();
      modules
    };
    let digest = xxhash_hex(modules.join(",").as_bytes());

    let cache_path = workspace.graph_cache_path(&digest);
    if let Some(graph) = read_persisted(&cache_path).await? {
      return Ok(Arc::new(graph));
    }

    let (id, build) = self.in_flight.join_or_insert(digest.clone(), workspace.root(), || {
      let base = base.clone();
      let compiled_dir = workspace.compiled_dir();
      let cache_path = cache_path.clone();
      let computations = Arc::clone(&self.computations);
      Box::pin(async move {
        computations.fetch_add(1, Ordering::Relaxed);
        let graph = scan_modules(&base, &modules).await?;
        persist_graph(&compiled_dir, &cache_path, &graph).await?;
        Ok(Arc::new(graph))
      })
    });
    let result = build.await;
    self.in_flight.remove_if_current(&digest, id);
    result
  }

  /// Forgets all in-flight computations. Persisted graph files live inside
  /// the workspaces and disappear with them on refresh.
  pub fn reset(&self) {
    self.in_flight.clear();
  }

  /// Number of full source scans performed so far.
  pub fn computations(&self) -> u64 {
    self.computations.load(Ordering::Relaxed)
  }
}

impl Default for GraphBuilder {
  fn default() -> Self {
    Self::new()
  }
}

/// Walks the resolution base and returns the sorted module ids of every
/// `.js` file, skipping the compiled-output directory and dot-directories.
fn enumerate_modules(base: &Path) -> BuildResult<Vec<String>> {
  let mut modules = Vec::new();
  let walker = WalkDir::new(base).into_iter().filter_entry(|entry| {
    if entry.depth() == 0 {
      return true;
    }
    let name = entry.file_name().to_string_lossy();
    !(entry.file_type().is_dir() && (name == COMPILED_DIR_NAME || name.starts_with('.')))
  });
  for entry in walker {
    let entry = entry.map_err(|err| BuildError::module_read(base.to_string_lossy(), err))?;
    if !entry.file_type().is_file() {
      continue;
    }
    let path = entry.path();
    if path.extension().is_none_or(|ext| ext != "js") {
      continue;
    }
    let relative = path.strip_prefix(base).unwrap_or(path).with_extension("");
    let id = match relative.to_slash() {
      Some(slashed) => slashed.into_owned(),
      None => relative.to_string_lossy().into_owned(),
    };
    modules.push(id);
  }
  modules.sort_unstable();
  modules.dedup();
  Ok(modules)
}

async fn read_persisted(cache_path: &Path) -> BuildResult<Option<DependencyGraph>> {
  let raw = match tokio::fs::read_to_string(cache_path).await {
    Ok(raw) => raw,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
    Err(err) => {
      return Err(BuildError::GraphCacheCorrupt {
        path: cache_path.to_path_buf(),
        reason: err.to_string(),
      });
    }
  };
  let graph = serde_json::from_str(&raw).map_err(|err| BuildError::GraphCacheCorrupt {
    path: cache_path.to_path_buf(),
    reason: err.to_string(),
  })?;
  Ok(Some(graph))
}

async fn scan_modules(base: &Path, modules: &[String]) -> BuildResult<DependencyGraph> {
  let scans = modules.iter().map(|id| scan_one(base, id));
  let records = futures::future::try_join_all(scans).await?;
  Ok(records.into_iter().collect())
}

async fn scan_one(base: &Path, id: &str) -> BuildResult<(String, ModuleRecord)> {
  let path = base.join(format!("{id}.js"));
  let source =
    tokio::fs::read_to_string(&path).await.map_err(|err| BuildError::module_read(id, err))?;
  let deps =
    extract_dependencies(id, &source).map_err(|reason| BuildError::module_parse(id, reason))?;
  let meta = extract_annotations(&source);
  tracing::trace!(module = id, deps = deps.len(), "scanned module");
  Ok((id.to_string(), ModuleRecord { deps, meta }))
}

async fn persist_graph(
  compiled_dir: &Path,
  cache_path: &Path,
  graph: &DependencyGraph,
) -> BuildResult<()> {
  tokio::fs::create_dir_all(compiled_dir)
    .await
    .map_err(|err| BuildError::persist(compiled_dir, err))?;
  let json = serde_json::to_string(graph)
    .map_err(|err| BuildError::persist(cache_path, err))?;
  tokio::fs::write(cache_path, json)
    .await
    .map_err(|err| BuildError::persist(cache_path, err))?;
  Ok(())
}
