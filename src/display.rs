use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Direct,
  Ascii,
  Off,
}

/// How thumbnails are drawn in the detail overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  Ascii,
  Direct,
  Off,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
      DisplayMode::Off => "Off",
    }
  }

  pub fn shows_thumbnails(self) -> bool {
    self != DisplayMode::Off
  }
}

/// Pick half-block rendering when the terminal advertises true colour.
///
/// - Direct: `COLORTERM` is `truecolor` or `24bit`
/// - Ascii: fallback
pub fn detect_display_mode() -> DisplayMode {
  let colorterm = std::env::var("COLORTERM").unwrap_or_default();
  mode_for_colorterm(&colorterm)
}

fn mode_for_colorterm(colorterm: &str) -> DisplayMode {
  match colorterm.to_lowercase().as_str() {
    "truecolor" | "24bit" => DisplayMode::Direct,
    _ => DisplayMode::Ascii,
  }
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
    CliDisplayMode::Off => DisplayMode::Off,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn colorterm_detection() {
    assert_eq!(mode_for_colorterm("truecolor"), DisplayMode::Direct);
    assert_eq!(mode_for_colorterm("24BIT"), DisplayMode::Direct);
    assert_eq!(mode_for_colorterm(""), DisplayMode::Ascii);
    assert_eq!(mode_for_colorterm("256color"), DisplayMode::Ascii);
  }

  #[test]
  fn explicit_modes_resolve_directly() {
    assert_eq!(resolve_display_mode(CliDisplayMode::Off), DisplayMode::Off);
    assert_eq!(resolve_display_mode(CliDisplayMode::Ascii), DisplayMode::Ascii);
    assert!(!DisplayMode::Off.shows_thumbnails());
  }
}
