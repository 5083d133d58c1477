use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const PREFS_FILE: &str = "prefs.toml";

/// User preferences persisted between sessions.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub sort_key: Option<String>,
  /// Last CSV path or URL, used when none is given on the command line.
  pub source: Option<String>,
}

/// Location of `prefs.toml` in the platform config dir.
pub fn prefs_path() -> Option<PathBuf> {
  ProjectDirs::from("", "", "epgrid").map(|dirs| dirs.config_dir().join(PREFS_FILE))
}

impl Config {
  pub fn load() -> Self {
    prefs_path().map(|p| Self::load_from(&p)).unwrap_or_default()
  }

  /// Read prefs from `path`, falling back to defaults when missing or malformed.
  pub fn load_from(path: &Path) -> Self {
    let Ok(content) = std::fs::read_to_string(path) else {
      return Self::default();
    };
    match toml::from_str(&content) {
      Ok(config) => config,
      Err(e) => {
        warn!(path = %path.display(), err = %e, "config: ignoring malformed prefs");
        Self::default()
      }
    }
  }

  pub fn save_to(&self, path: &Path) {
    if let Some(dir) = path.parent()
      && let Err(e) = std::fs::create_dir_all(dir)
    {
      warn!(path = %dir.display(), err = %e, "config: failed to create config dir");
      return;
    }
    match toml::to_string(self) {
      Ok(content) => {
        if let Err(e) = std::fs::write(path, content) {
          warn!(path = %path.display(), err = %e, "config: failed to write prefs");
        }
      }
      Err(e) => warn!(err = %e, "config: failed to serialize prefs"),
    }
  }
}
