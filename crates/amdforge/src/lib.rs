mod assembler;
mod cache;
mod filter;
mod fingerprint;
mod graph;
mod optimizer;
mod reachability;
mod service;

pub use crate::{
  cache::{BuildCache, BuildOutput},
  filter::FilterRegistry,
  fingerprint::build_fingerprint,
  graph::GraphBuilder,
  optimizer::CatOptimizer,
  reachability::{collect_resources_by_group, resolve_group_files},
  service::{BuildService, BundleArtifact},
};
pub use amdforge_common::*;
pub use amdforge_error::{BuildError, BuildResult};
