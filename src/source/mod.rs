//! Module source resolution
//!
//! A [`SourceDescriptor`] pins down, for one acquisition, where a module comes
//! from and where it lands on disk:
//!
//! ```text
//! <cache root>/<id(module dir)>/<id(source without query)>/   download dir
//! <cache root>/<id(module dir)>/<id(source without query)>/<subdir>/   working dir
//! <cache root>/<id(module dir)>/<id(source without query)>/.modcache-source-version
//! ```
//!
//! Every path is derived from the canonical URL and the module directory, so
//! the same reference always maps to the same download directory across runs.

pub mod url;
pub mod version;

pub use url::{normalize_path, split_source, SourceUrl, FILE_PROTOCOL};
pub use version::{encode_source_version, VERSION_FILE_NAME};

use crate::error::{ModcacheError, ModcacheResult};
use crate::options::RunOptions;
use std::path::{Path, PathBuf};

/// A resolved module source and its derived cache paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Reference as written by the operator or configuration
    pub raw: String,

    /// Canonical root URL (without the module subdirectory)
    pub canonical_url: SourceUrl,

    /// Directory the source is downloaded into
    pub download_dir: PathBuf,

    /// Directory the wrapped tool runs in (download dir + module subdirectory)
    pub working_dir: PathBuf,

    /// Version marker recording the last downloaded fingerprint
    pub version_file: PathBuf,
}

impl SourceDescriptor {
    /// Resolve a raw reference against the options of the current run
    pub fn resolve(raw: &str, opts: &RunOptions) -> ModcacheResult<Self> {
        let module_dir = absolute(&opts.working_dir)?;
        let (canonical_url, subdir) = split_source(raw, &module_dir)?;

        let source_id = version::encode_dir_id(&canonical_url.without_query().to_string());
        let download_dir = Self::module_cache_dir(opts)?.join(source_id);

        let working_dir = if subdir.is_empty() {
            download_dir.clone()
        } else {
            download_dir.join(subdir)
        };
        let version_file = download_dir.join(VERSION_FILE_NAME);

        Ok(Self {
            raw: raw.to_string(),
            canonical_url,
            download_dir,
            working_dir,
            version_file,
        })
    }

    /// Directory holding every download made for `opts.working_dir`
    ///
    /// Other module directories sharing the same cache root get their own
    /// sibling directories.
    pub fn module_cache_dir(opts: &RunOptions) -> ModcacheResult<PathBuf> {
        let module_dir = absolute(&opts.working_dir)?;
        let cache_root = absolute(&opts.download_dir)?;
        Ok(cache_root.join(version::encode_dir_id(&module_dir.to_string_lossy())))
    }

    /// Whether the source is a local path (never cached)
    pub fn is_local(&self) -> bool {
        self.canonical_url.is_local()
    }

    /// Fingerprint of the current canonical URL
    pub fn encode_version(&self) -> String {
        encode_source_version(&self.canonical_url)
    }

    /// Fingerprint stored by the last successful download
    pub async fn read_version_file(&self) -> ModcacheResult<String> {
        version::read_version_file(&self.version_file).await
    }

    /// Record the current fingerprint as downloaded
    pub async fn write_version_file(&self) -> ModcacheResult<()> {
        version::write_version_file(&self.version_file, &self.encode_version()).await
    }
}

fn absolute(path: &Path) -> ModcacheResult<PathBuf> {
    let abs = std::path::absolute(path)
        .map_err(|e| ModcacheError::io(format!("resolving {}", path.display()), e))?;
    Ok(normalize_path(&abs))
}
