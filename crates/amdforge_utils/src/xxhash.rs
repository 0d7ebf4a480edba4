use xxhash_rust::xxh3::{xxh3_128, Xxh3};

/// Digest `input` to a 32-character lowercase hex string. Used everywhere a
/// content hash becomes part of a file name or cache key.
pub fn xxhash_hex(input: &[u8]) -> String {
  format!("{:032x}", xxh3_128(input))
}

/// Incremental variant of [`xxhash_hex`] for multi-part fingerprints.
pub struct HexHasher(Xxh3);

impl HexHasher {
  pub fn new() -> Self {
    Self(Xxh3::new())
  }

  pub fn update(&mut self, part: impl AsRef<[u8]>) -> &mut Self {
    self.0.update(part.as_ref());
    self
  }

  pub fn digest(&self) -> String {
    format!("{:032x}", self.0.digest128())
  }
}

impl Default for HexHasher {
  fn default() -> Self {
    Self::new()
  }
}

#[test]
fn test_xxhash_hex() {
  let digest = xxhash_hex(b"main,widget");
  assert_eq!(digest.len(), 32);
  assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));
  assert_eq!(digest, xxhash_hex(b"main,widget"));
  assert_ne!(digest, xxhash_hex(b"main,widget,theme"));
}

#[test]
fn test_hex_hasher_matches_one_shot() {
  let mut hasher = HexHasher::new();
  hasher.update(b"main,").update(b"widget");
  assert_eq!(hasher.digest(), xxhash_hex(b"main,widget"));
}
