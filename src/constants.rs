//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so there is no runtime file
//! I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  /// CSV used when neither the CLI nor prefs name one.
  pub default_source: String,

  // Grid & pagination
  pub page_size: usize,
  pub page_window: usize,
  pub grid_card_height: u16,

  // Outbound links, `{id}` is replaced with the episode id
  pub watch_url: String,
  pub embed_url: String,
  pub thumbnail_fallbacks: Vec<String>,

  pub error_dismiss_secs: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; the unit test below parses it.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

/// Substitute an episode id into a `{id}` URL template.
pub fn expand_template(template: &str, id: &str) -> String {
  template.replace("{id}", id)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.page_size, 21);
    assert_eq!(c.page_window, 5);
    assert!(c.watch_url.contains("{id}"));
    assert!(c.embed_url.contains("{id}"));
    assert!(!c.thumbnail_fallbacks.is_empty());
  }

  #[test]
  fn expand_template_replaces_every_placeholder() {
    assert_eq!(expand_template("a/{id}/b/{id}", "xyz"), "a/xyz/b/xyz");
    assert_eq!(expand_template("no placeholder", "xyz"), "no placeholder");
  }
}
