//! Configuration management for modcache

pub mod schema;

pub use schema::{CacheConfig, Config, Hook, HooksConfig, ModuleConfig};

use crate::error::{ModcacheError, ModcacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Default config file name inside a module directory
pub const CONFIG_FILE_NAME: &str = "modcache.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
    explicit: bool,
}

impl ConfigManager {
    /// Create a config manager for the config file inside a module directory
    pub fn for_module(module_dir: &Path) -> Self {
        Self {
            config_path: module_dir.join(CONFIG_FILE_NAME),
            explicit: false,
        }
    }

    /// Create a config manager with a custom path
    ///
    /// Unlike the per-module default, an explicit path must exist.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            explicit: true,
        }
    }

    /// Load configuration, falling back to defaults if the file does not exist
    pub async fn load(&self) -> ModcacheResult<Config> {
        if !self.config_path.exists() {
            if self.explicit {
                return Err(ModcacheError::ConfigNotFound(self.config_path.clone()));
            }
            debug!(
                "Config file {} not found, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ModcacheResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ModcacheError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| ModcacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
