use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub struct ProjectArgs {
  /// Project to build, as `owner/repo@ref`.
  pub project: String,

  /// Directory holding the hosted git clones, `<owner>/<repo>[.git]`.
  #[clap(long, short = 'r', default_value = "repos")]
  pub repo_dir: PathBuf,

  /// Directory workspaces are checked out under.
  #[clap(long, short = 's', default_value = "staging")]
  pub staging_dir: PathBuf,
}

#[derive(Args)]
pub struct BundleArgs {
  /// Entry module, repeatable. Defaults to `main`.
  #[clap(long, short = 'i', action = clap::ArgAction::Append)]
  pub include: Vec<String>,

  /// Module to exclude from the bundle, repeatable.
  #[clap(long, short = 'x', action = clap::ArgAction::Append)]
  pub exclude: Vec<String>,

  /// Bundle name; the extension selects the artifact kind
  /// (`.js`, `.css`, `.zip`). Defaults to `<repo>.js`.
  #[clap(long, short = 'n')]
  pub name: Option<String>,

  /// Module resolution root, relative to the workspace.
  #[clap(long)]
  pub base_url: Option<String>,

  #[clap(long, short = 'm')]
  pub minify: bool,

  /// Re-checkout the workspace before building.
  #[clap(long)]
  pub refresh: bool,

  /// Print the dependency graph as JSON instead of building.
  #[clap(long)]
  pub deps: bool,
}
