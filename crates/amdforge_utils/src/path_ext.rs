use std::borrow::Cow;

use sugar_path::SugarPath;

pub trait PathExt {
  fn expect_to_str(&self) -> &str;

  fn expect_to_slash(&self) -> String;
}

impl PathExt for std::path::Path {
  fn expect_to_str(&self) -> &str {
    self.to_str().unwrap_or_else(|| {
      panic!("Failed to convert {:?} to valid utf8 str", self.display());
    })
  }

  fn expect_to_slash(&self) -> String {
    self
      .to_slash()
      .unwrap_or_else(|| panic!("Failed to convert {:?} to slash str", self.display()))
      .into_owned()
  }
}

/// Strips a trailing extension from a module-ish file name.
pub fn strip_extension(name: &str) -> Cow<str> {
  match name.rfind('.') {
    Some(idx) if idx > 0 => Cow::Borrowed(&name[..idx]),
    _ => Cow::Borrowed(name),
  }
}

#[test]
fn test_strip_extension() {
  assert_eq!(strip_extension("widget.js"), "widget");
  assert_eq!(strip_extension("jquery.plugin.js"), "jquery.plugin");
  assert_eq!(strip_extension(".hidden"), ".hidden");
  assert_eq!(strip_extension("noext"), "noext");
}
