//! Configuration schema for modcache
//!
//! Configuration is stored per module directory in `modcache.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Module source settings
    pub module: ModuleConfig,

    /// Download cache settings
    pub cache: CacheConfig,

    /// Lifecycle hooks
    pub hooks: HooksConfig,
}

/// Where the module code lives
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Module source reference (e.g. `git::https://host/repo.git//sub?ref=v1`)
    pub source: Option<String>,
}

/// Download cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory (default: `<working dir>/.modcache`)
    pub root: Option<PathBuf>,

    /// File extensions that mark a directory as holding wrapped-tool configuration
    pub config_extensions: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            config_extensions: vec!["tf".to_string(), "tf.json".to_string()],
        }
    }
}

/// Before and after hook declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Hooks run before a matching command
    pub before: Vec<Hook>,

    /// Hooks run after a matching command
    pub after: Vec<Hook>,
}

/// A single hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    /// Name used in logs and errors
    pub name: String,

    /// Commands this hook is attached to
    pub commands: Vec<String>,

    /// Program and arguments to execute
    pub execute: Vec<String>,

    /// Run this (after) hook even when the wrapped action failed
    #[serde(default)]
    pub run_on_error: bool,
}

impl Hook {
    /// Whether the hook is attached to the given command
    pub fn matches(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c == command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("config_extensions"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.module.source.is_none());
        assert_eq!(config.cache.config_extensions, vec!["tf", "tf.json"]);
        assert!(config.hooks.before.is_empty());
    }

    #[test]
    fn config_deserializes_hooks() {
        let toml = r#"
            [module]
            source = "git::https://example.com/mod.git?ref=v1"

            [[hooks.before]]
            name = "announce"
            commands = ["init-from-module"]
            execute = ["echo", "fetching"]

            [[hooks.after]]
            name = "cleanup"
            commands = ["init-from-module", "plan"]
            execute = ["true"]
            run_on_error = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.module.source.as_deref(),
            Some("git::https://example.com/mod.git?ref=v1")
        );
        assert_eq!(config.hooks.before.len(), 1);
        assert!(!config.hooks.before[0].run_on_error);
        assert!(config.hooks.after[0].run_on_error);
        assert!(config.hooks.after[0].matches("plan"));
        assert!(!config.hooks.after[0].matches("apply"));
    }
}
