//! Source version fingerprints and the on-disk version marker

use crate::error::{ModcacheError, ModcacheResult};
use crate::source::url::SourceUrl;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

/// File name of the version marker inside a download directory
pub const VERSION_FILE_NAME: &str = ".modcache-source-version";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fingerprint identifying one exact version of one exact source.
///
/// Derived from the canonical root URL only, so upstream changes behind an
/// unchanged reference are not noticed.
pub fn encode_source_version(url: &SourceUrl) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.to_string().as_bytes());
    let result = hasher.finalize();

    // First 32 hex characters (16 bytes)
    hex::encode(&result[..16])
}

/// Short stable identifier used for cache directory names
pub fn encode_dir_id(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(&hasher.finalize()[..12])
}

/// Read the fingerprint stored in a version marker
pub async fn read_version_file(path: &Path) -> ModcacheResult<String> {
    let content = fs::read_to_string(path).await.map_err(|e| {
        ModcacheError::io(format!("reading version file {}", path.display()), e)
    })?;
    Ok(content.trim().to_string())
}

/// Atomically write a fingerprint to a version marker.
///
/// Writes to a unique sibling temp file and renames it into place, so a
/// reader never sees a partially written marker.
pub async fn write_version_file(path: &Path, version: &str) -> ModcacheResult<()> {
    let persist = |source: std::io::Error| ModcacheError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(persist)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| VERSION_FILE_NAME.to_string());
    let temp = path.with_file_name(format!(
        ".{}.{}-{}.tmp",
        file_name.trim_start_matches('.'),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&temp, version).await.map_err(persist)?;
    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(persist(e));
    }
    Ok(())
}
