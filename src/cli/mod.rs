//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use crate::config::{Config, ConfigManager};
use crate::error::{ModcacheError, ModcacheResult};
use crate::options::RunOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Module directory argument, defaulting to the current directory
pub(crate) fn module_dir(dir: Option<&Path>) -> ModcacheResult<PathBuf> {
    match dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| ModcacheError::io("getting current directory", e)),
    }
}

/// Load the configuration and run options for one module directory
///
/// An explicit `--config` path is used for every module; otherwise each
/// module reads its own `modcache.toml`.
pub(crate) async fn load_module(
    dir: &Path,
    config_path: Option<&Path>,
    download_dir: Option<&Path>,
) -> ModcacheResult<(Config, RunOptions)> {
    if !dir.is_dir() {
        return Err(ModcacheError::User(format!(
            "module directory not found: {}",
            dir.display()
        )));
    }

    let manager = match config_path {
        Some(path) => ConfigManager::with_path(path.to_path_buf()),
        None => ConfigManager::for_module(dir),
    };
    debug!("Loading configuration from {}", manager.path().display());
    let config = manager.load().await?;

    let mut opts = RunOptions::from_config(dir, &config);
    if let Some(root) = download_dir {
        opts.download_dir = dir.join(root);
    }
    Ok((config, opts))
}
