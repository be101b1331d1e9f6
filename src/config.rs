// CLI configuration loaded from YAML

use crate::filter::SortOrder;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding `store_path`
pub const STORE_PATH_ENV: &str = "NOTESTORE_PATH";

const APP_DIR: &str = "notestore";
const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the `.notestore` folder is created in
    pub store_path: Option<PathBuf>,
    /// Sort order used by `list` when none is given
    pub default_sort: SortOrder,
}

impl Config {
    /// Load config from `path`, or from the default location when `path` is `None`
    ///
    /// An explicitly given file must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, default_config_path(), std::env::var(STORE_PATH_ENV).ok())
    }

    fn load_with(path: Option<&Path>, default_path: Option<PathBuf>, store_path_env: Option<String>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_path {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        match store_path_env {
            Some(value) if !value.trim().is_empty() => config.store_path = Some(PathBuf::from(value)),
            _ => {}
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_yaml(&data).with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(data).context("Failed to parse YAML")
    }

    /// Directory to open the store in: configured path, else the user data dir, else cwd
    pub fn resolve_store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// `<config_dir>/notestore/config.yml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}
