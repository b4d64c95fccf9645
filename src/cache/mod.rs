//! Cache validity decisions for downloaded module sources
//!
//! A cached download is trusted only when every check below passes, in order:
//!
//! | Check | Decision |
//! |-------|----------|
//! | Update forced | fetch |
//! | Source is a local path | fetch (never cached) |
//! | Download dir, working dir or version marker missing | fetch |
//! | Working dir holds no recognized configuration files | fetch |
//! | Stored fingerprint differs from current | fetch |
//! | Otherwise | reuse |

use crate::error::ModcacheResult;
use crate::source::SourceDescriptor;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Why a cached download is or is not reused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// The caller asked for a fresh download
    Forced,
    /// Local sources are re-copied on every run
    LocalSource,
    /// A required path does not exist
    Missing(PathBuf),
    /// The working dir exists but holds no recognized configuration
    NoConfigFiles,
    /// The source reference changed since the last download
    VersionChanged { previous: String, current: String },
    /// The cached download matches the current reference
    UpToDate,
}

impl CacheDecision {
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, CacheDecision::UpToDate)
    }
}

impl fmt::Display for CacheDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheDecision::Forced => write!(f, "update forced"),
            CacheDecision::LocalSource => write!(f, "local source"),
            CacheDecision::Missing(path) => write!(f, "{} does not exist", path.display()),
            CacheDecision::NoConfigFiles => write!(f, "no configuration files in working dir"),
            CacheDecision::VersionChanged { previous, current } => {
                write!(f, "version changed ({} -> {})", previous, current)
            }
            CacheDecision::UpToDate => write!(f, "up to date"),
        }
    }
}

/// Decide whether `source` has to be downloaded again.
///
/// `config_extensions` are the file extensions (without the leading dot) that
/// mark a file as configuration of the wrapped tool.
pub async fn check(
    source: &SourceDescriptor,
    force: bool,
    config_extensions: &[String],
) -> ModcacheResult<CacheDecision> {
    if force {
        return Ok(CacheDecision::Forced);
    }

    if source.is_local() {
        return Ok(CacheDecision::LocalSource);
    }

    for path in [&source.download_dir, &source.working_dir, &source.version_file] {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(CacheDecision::Missing(path.clone()));
        }
    }

    if !has_config_files(&source.working_dir, config_extensions).await {
        return Ok(CacheDecision::NoConfigFiles);
    }

    let previous = source.read_version_file().await?;
    let current = source.encode_version();
    debug!("Cached version {}, current version {}", previous, current);

    if previous == current {
        Ok(CacheDecision::UpToDate)
    } else {
        Ok(CacheDecision::VersionChanged { previous, current })
    }
}

/// Whether `source` has to be downloaded again
pub async fn should_fetch(
    source: &SourceDescriptor,
    force: bool,
    config_extensions: &[String],
) -> ModcacheResult<bool> {
    Ok(check(source, force, config_extensions).await?.needs_fetch())
}

/// Whether `dir` directly contains a file with one of `extensions`
async fn has_config_files(dir: &Path, extensions: &[String]) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return false;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if extensions
            .iter()
            .any(|ext| name.ends_with(&format!(".{}", ext)))
        {
            return true;
        }
    }
    false
}
