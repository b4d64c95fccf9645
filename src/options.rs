//! Per-invocation run options

use crate::config::Config;
use std::path::PathBuf;

/// Default cache directory name, created inside the module directory
pub const DEFAULT_CACHE_DIR_NAME: &str = ".modcache";

/// Options for one acquisition
///
/// Owned by a single acquisition; hook-wrapped actions get a clone with the
/// command replaced rather than a mutated original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Directory the wrapped tool runs in; repointed after a successful acquisition
    pub working_dir: PathBuf,

    /// Cache root under which sources are downloaded
    pub download_dir: PathBuf,

    /// Explicit source reference, takes precedence over the configured one
    pub source: Option<String>,

    /// Discard any cached copy before downloading
    pub source_update: bool,

    /// Command the wrapped tool is running (used to select hooks)
    pub command: String,
}

impl RunOptions {
    /// Options for a module directory with the default cache root
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        Self {
            download_dir: working_dir.join(DEFAULT_CACHE_DIR_NAME),
            working_dir,
            source: None,
            source_update: false,
            command: "init".to_string(),
        }
    }

    /// Options for a module directory, honoring the configured cache root
    ///
    /// A relative `cache.root` is taken relative to the module directory.
    pub fn from_config(working_dir: impl Into<PathBuf>, config: &Config) -> Self {
        let mut opts = Self::new(working_dir);
        if let Some(ref root) = config.cache.root {
            opts.download_dir = opts.working_dir.join(root);
        }
        opts
    }

    /// Clone these options with a different command
    pub fn with_command(&self, command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..self.clone()
        }
    }

    /// The source reference to acquire: explicit option first, then configuration
    pub fn source_url(&self, config: &Config) -> Option<String> {
        self.source
            .as_deref()
            .or(config.module.source.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}
