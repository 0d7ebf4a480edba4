mod build_request;
mod bundle_config;
mod collab;
mod module;
mod optimize_mode;
mod output_kind;
mod workspace;

pub use crate::{
  build_request::BuildRequest,
  bundle_config::BundleConfig,
  collab::{BundleFilter, Optimizer, OptimizerConfig, SourceProvider, StyleOptimizeConfig},
  module::{DependencyGraph, MetaValue, ModuleRecord, DEFAULT_GROUP, STYLE_META_KEY},
  optimize_mode::OptimizeMode,
  output_kind::OutputKind,
  workspace::{ProjectRef, WorkspaceLayout, COMPILED_DIR_NAME},
};
