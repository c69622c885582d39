use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub catalog: CatalogConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  /// Root of the volumes API
  pub base_url: String,
  /// Connect and read timeout for catalog requests
  pub timeout_secs: u64,
  /// URL used by the connectivity probe (defaults to base_url)
  pub probe_url: Option<String>,
  pub probe_timeout_secs: u64,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      base_url: "https://www.googleapis.com/books/v1/".to_string(),
      timeout_secs: 15,
      probe_url: None,
      probe_timeout_secs: 3,
    }
  }
}

impl CatalogConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  pub fn probe_timeout(&self) -> Duration {
    Duration::from_secs(self.probe_timeout_secs)
  }

  pub fn probe_url(&self) -> &str {
    self.probe_url.as_deref().unwrap_or(&self.base_url)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// When false, nothing is cached and offline lookups come back empty
  pub enabled: bool,
  /// Database location (defaults to $XDG_DATA_HOME/bookshelf/cache.db)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  /// Query loaded when the interactive prompt starts
  pub default_query: Option<String>,
  /// Apply only the most recently issued request's result
  pub discard_stale: bool,
  /// Rows listed by `:recent`
  pub recent_limit: usize,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      default_query: Some("programming".to_string()),
      discard_stale: false,
      recent_limit: 20,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./bookshelf.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/bookshelf/config.yaml
  ///
  /// Every setting has a default, so a missing file yields `Config::default()`.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("bookshelf.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("bookshelf").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to unit, not to an empty mapping
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }
}
