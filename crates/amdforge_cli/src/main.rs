mod args;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use ansi_term::Colour;
use args::{BundleArgs, ProjectArgs};
use clap::Parser;

use amdforge::{BuildRequest, BuildService, BundleConfig, CatOptimizer, ProjectRef};
use amdforge_source::GitSourceProvider;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Commands {
  #[clap(flatten)]
  project: ProjectArgs,

  #[clap(flatten)]
  bundle: BundleArgs,
}

fn parse_project(raw: &str) -> Option<ProjectRef> {
  let (path, reference) = raw.split_once('@')?;
  let (owner, repo) = path.split_once('/')?;
  if owner.is_empty() || repo.is_empty() || reference.is_empty() {
    return None;
  }
  Some(ProjectRef::new(owner, repo, reference))
}

fn print_artifacts(files: &[PathBuf]) {
  let mut left = 0;
  let mut right = 0;

  let mut rows = Vec::with_capacity(files.len());
  for file in files {
    let bytes = std::fs::metadata(file).map(|meta| meta.len()).unwrap_or(0);
    let size = format!("{:.2}", bytes as f64 / 1024.0);
    let name = file.display().to_string();

    if name.len() > left {
      left = name.len();
    }
    if size.len() > right {
      right = size.len();
    }
    rows.push((name, size));
  }

  let dim = Colour::White.dimmed();
  let color = Colour::Cyan;

  for (name, size) in rows {
    let name_len = name.len();
    println!(
      "{}{:left$} {}{:right$}{} kB",
      color.paint(name),
      "",
      dim.paint(" │ size: "),
      "",
      size,
      left = left - name_len,
      right = right - size.len()
    );
  }
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let args = Commands::parse();
  let Some(project) = parse_project(&args.project.project) else {
    println!("{} expected project as owner/repo@ref", Colour::Red.paint("Error:"));
    return;
  };

  let source = GitSourceProvider::new(args.project.repo_dir, args.project.staging_dir);
  let service = BuildService::new(Arc::new(source), Arc::new(CatOptimizer::new()));

  if args.bundle.refresh {
    if let Err(error) = service.refresh(&project).await {
      println!("{} {error}", Colour::Red.paint("Error:"));
      return;
    }
  }

  let mut config = BundleConfig::new(args.bundle.include, args.bundle.exclude);
  if let Some(base_url) = args.bundle.base_url {
    config = config.with_base_url(base_url);
  }
  if args.bundle.deps {
    match service.dependency_graph(&project, &config).await {
      Ok(graph) => match serde_json::to_string_pretty(&*graph) {
        Ok(json) => println!("{json}"),
        Err(error) => println!("{} {error}", Colour::Red.paint("Error:")),
      },
      Err(error) => println!("{} {error}", Colour::Red.paint("Error:")),
    }
    return;
  }

  let mut request = BuildRequest::new(project, config).with_optimize(args.bundle.minify);
  if let Some(name) = args.bundle.name {
    request = request.with_bundle_name(name);
  }

  let start = Instant::now();
  match service.bundle(&request).await {
    Ok(artifact) => {
      if artifact.files.is_empty() {
        println!("{} no artifacts produced", Colour::Yellow.paint("Warning:"));
      } else {
        print_artifacts(&artifact.files);
      }

      let elapsed = format!("{:.2} ms", start.elapsed().as_secs_f64() * 1000.0);
      println!("\n{} Finished in {}", Colour::Green.paint("✔"), Colour::White.bold().paint(elapsed));
    }
    Err(error) => {
      println!("{} {error}", Colour::Red.paint("Error:"));
    }
  }
}
