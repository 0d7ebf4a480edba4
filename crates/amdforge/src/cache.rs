use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use amdforge_common::OutputKind;
use amdforge_error::BuildResult;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use rustc_hash::FxHashMap;

/// A pending-or-settled build observed by every deduplicated waiter.
pub(crate) type SharedBuild<T> = Shared<BoxFuture<'static, BuildResult<T>>>;

/// The settled value of a bundle build: one artifact path, or an ordered
/// list of them (style builds can produce one file per named group).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutput {
  Single(PathBuf),
  Many(Vec<PathBuf>),
}

impl BuildOutput {
  pub fn files(&self) -> &[PathBuf] {
    match self {
      Self::Single(path) => std::slice::from_ref(path),
      Self::Many(paths) => paths,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.files().is_empty()
  }
}

struct Slot<T: Clone> {
  id: u64,
  root: PathBuf,
  build: SharedBuild<T>,
}

/// Table of in-flight-or-settled shared builds.
///
/// Insertion and lookup happen under one synchronous lock acquisition, so
/// two racing callers can never both become the owner of a key. The slot id
/// makes eviction race-free: a waiter that saw build `N` fail only removes
/// the slot if it still holds build `N`, never a fresh replacement.
pub(crate) struct SharedTable<K, T: Clone> {
  slots: Mutex<FxHashMap<K, Slot<T>>>,
  next_id: AtomicU64,
}

impl<K: Eq + Hash + Clone, T: Clone> SharedTable<K, T> {
  pub fn new() -> Self {
    Self { slots: Mutex::new(FxHashMap::default()), next_id: AtomicU64::new(0) }
  }

  /// Joins the build for `key`, or installs the one produced by `factory`.
  /// `factory` runs at most once per occupancy of the key.
  pub fn join_or_insert<F>(&self, key: K, root: &Path, factory: F) -> (u64, SharedBuild<T>)
  where
    F: FnOnce() -> BoxFuture<'static, BuildResult<T>>,
  {
    let mut slots = self.slots.lock().expect("build table poisoned");
    if let Some(slot) = slots.get(&key) {
      return (slot.id, slot.build.clone());
    }
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let build = factory().shared();
    slots.insert(key, Slot { id, root: root.to_path_buf(), build: build.clone() });
    (id, build)
  }

  /// Removes the slot for `key` if it still holds build `id`.
  pub fn remove_if_current(&self, key: &K, id: u64) {
    let mut slots = self.slots.lock().expect("build table poisoned");
    if slots.get(key).is_some_and(|slot| slot.id == id) {
      slots.remove(key);
    }
  }

  pub fn remove(&self, key: &K) {
    self.slots.lock().expect("build table poisoned").remove(key);
  }

  pub fn remove_under_root(&self, root: &Path) {
    self.slots.lock().expect("build table poisoned").retain(|_, slot| slot.root != root);
  }

  pub fn clear(&self) {
    self.slots.lock().expect("build table poisoned").clear();
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.slots.lock().expect("build table poisoned").len()
  }
}

/// Process-wide memoization of bundle builds, keyed by artifact kind and
/// fingerprint. At most one build per key is ever active; settled successes
/// stay until the owning workspace is refreshed, settled failures are
/// evicted so the next request retries from scratch.
pub struct BuildCache {
  table: SharedTable<(OutputKind, String), BuildOutput>,
}

impl BuildCache {
  pub fn new() -> Self {
    Self { table: SharedTable::new() }
  }

  pub async fn get_or_create<F>(
    &self,
    kind: OutputKind,
    key: String,
    workspace_root: &Path,
    factory: F,
  ) -> BuildResult<BuildOutput>
  where
    F: FnOnce() -> BoxFuture<'static, BuildResult<BuildOutput>>,
  {
    let table_key = (kind, key);
    let (id, build) = self.table.join_or_insert(table_key.clone(), workspace_root, factory);
    match build.await {
      Ok(output) => Ok(output),
      Err(err) => {
        self.table.remove_if_current(&table_key, id);
        Err(err)
      }
    }
  }

  /// Drops a settled entry whose artifact turned out to be gone. The next
  /// `get_or_create` for the key rebuilds.
  pub fn evict(&self, kind: OutputKind, key: &str) {
    self.table.remove(&(kind, key.to_string()));
  }

  /// Drops every entry rooted in `workspace_root`. Invoked when a workspace
  /// is refreshed to a new revision.
  pub fn invalidate_workspace(&self, workspace_root: &Path) {
    tracing::debug!(root = %workspace_root.display(), "invalidating build cache for workspace");
    self.table.remove_under_root(workspace_root);
  }

  pub fn clear(&self) {
    self.table.clear();
  }
}

impl Default for BuildCache {
  fn default() -> Self {
    Self::new()
  }
}
