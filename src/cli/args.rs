//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Modcache - module source cache
///
/// Downloads infrastructure module sources, caches them by version and
/// overlays the local module directory onto the downloaded copy.
#[derive(Parser, Debug)]
#[command(name = "modcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path (default: <module dir>/modcache.toml)
    #[arg(short, long, global = true, env = "MODCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download module sources and overlay the module directories
    Fetch(FetchArgs),

    /// Show the resolved source and cache state of a module
    Status(StatusArgs),

    /// Remove the cached downloads of a module
    Clean(CleanArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Module directories (default: current directory)
    pub dirs: Vec<PathBuf>,

    /// Source reference, overrides module.source from configuration
    #[arg(short, long, env = "MODCACHE_SOURCE")]
    pub source: Option<String>,

    /// Discard cached copies and download again
    #[arg(long)]
    pub source_update: bool,

    /// Cache root, overrides cache.root from configuration
    #[arg(long, env = "MODCACHE_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Module directory (default: current directory)
    pub dir: Option<PathBuf>,

    /// Source reference, overrides module.source from configuration
    #[arg(short, long, env = "MODCACHE_SOURCE")]
    pub source: Option<String>,

    /// Cache root, overrides cache.root from configuration
    #[arg(long, env = "MODCACHE_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Module directory (default: current directory)
    pub dir: Option<PathBuf>,

    /// Cache root, overrides cache.root from configuration
    #[arg(long, env = "MODCACHE_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,
}

/// Output format for status
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}
