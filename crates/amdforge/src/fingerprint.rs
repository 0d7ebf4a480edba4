use amdforge_common::{BuildRequest, OutputKind};
use amdforge_utils::xxhash::HexHasher;

/// Computes the deterministic build fingerprint for a request.
///
/// Covers the full effective configuration: project identity, the canonical
/// config JSON (entries, exclusions, base-url, pragmas, pass-through
/// options), the output MIME type, the filter identifier, and (for archives
/// only) the caller-visible bundle name, because that name determines the
/// file names inside the zip. Every other call site derives cache keys and
/// artifact names from this one digest.
pub fn build_fingerprint(request: &BuildRequest) -> String {
  let mut hasher = HexHasher::new();
  hasher
    .update(&request.project.owner)
    .update("\n")
    .update(&request.project.repo)
    .update("\n")
    .update(&request.project.reference)
    .update("\n")
    .update(request.config.canonical_json())
    .update("\n")
    .update(request.kind().mime_type());
  if let Some(filter) = &request.filter {
    hasher.update("\n").update(filter);
  }
  if request.kind() == OutputKind::Archive {
    hasher.update("\n").update(request.output_name());
  }
  hasher.digest()
}

#[cfg(test)]
mod tests {
  use amdforge_common::{BundleConfig, ProjectRef};

  use super::*;

  fn request(repo: &str, include: Vec<String>) -> BuildRequest {
    BuildRequest::new(ProjectRef::new("owner", repo, "main"), BundleConfig::new(include, vec![]))
  }

  #[test]
  fn identical_requests_share_a_fingerprint() {
    let a = request("widgets", vec!["main".into(), "widget".into()]);
    let b = request("widgets", vec!["widget".into(), "main".into()]);
    assert_eq!(build_fingerprint(&a), build_fingerprint(&b));
  }

  #[test]
  fn every_relevant_field_changes_the_fingerprint() {
    let base = request("widgets", vec!["main".into()]);
    let digest = build_fingerprint(&base);

    assert_ne!(digest, build_fingerprint(&request("gadgets", vec!["main".into()])));
    assert_ne!(digest, build_fingerprint(&request("widgets", vec!["other".into()])));
    assert_ne!(digest, build_fingerprint(&base.clone().with_filter("strip-banner")));

    let mut excluded = base.clone();
    excluded.config = BundleConfig::new(vec!["main".into()], vec!["vendor".into()]);
    assert_ne!(digest, build_fingerprint(&excluded));

    // Kind is part of the digest through the MIME type.
    assert_ne!(digest, build_fingerprint(&base.clone().with_bundle_name("widgets.css")));
  }

  #[test]
  fn bundle_name_only_matters_for_archives() {
    let base = request("widgets", vec!["main".into()]);
    let named = base.clone().with_bundle_name("custom.js");
    assert_eq!(build_fingerprint(&base), build_fingerprint(&named));

    let zip_a = base.clone().with_bundle_name("widgets.zip");
    let zip_b = base.clone().with_bundle_name("custom.zip");
    assert_ne!(build_fingerprint(&zip_a), build_fingerprint(&zip_b));
  }
}
