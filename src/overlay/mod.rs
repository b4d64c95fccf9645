//! Overlay of the operator's module directory onto a downloaded source
//!
//! Locally authored files (variable files, backend settings, extra
//! resources) are copied over the fetched tree so they take effect next to
//! the remote module code. Hidden paths are never copied, which keeps tool
//! state and the cache directory itself out of the overlay.

pub mod manifest;

pub use manifest::FileManifest;

use crate::error::{ModcacheError, ModcacheResult};
use crate::fsutil;
use std::path::Path;
use tracing::debug;

/// Copy the contents of `from` into `to`, excluding `manifest_name`.
///
/// Files recorded by the previous overlay into `to` are removed first, so
/// deleting a file in `from` removes it from `to` on the next run. Files named
/// `manifest_name` in `from` are never copied.
pub async fn copy_folder_contents(from: &Path, to: &Path, manifest_name: &str) -> ModcacheResult<()> {
    let from = from.to_path_buf();
    let to = to.to_path_buf();
    let manifest_name = manifest_name.to_string();

    let (err_from, err_to) = (from.clone(), to.clone());
    tokio::task::spawn_blocking(move || copy_folder_contents_blocking(&from, &to, &manifest_name))
        .await
        .map_err(|e| ModcacheError::Internal(format!("overlay task failed: {}", e)))?
        .map_err(|e| ModcacheError::overlay(err_from, err_to, e.to_string()))
}

fn copy_folder_contents_blocking(from: &Path, to: &Path, manifest_name: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;

    FileManifest::load(to, manifest_name).clean(to, manifest_name)?;

    let files = fsutil::copy_tree(from, to, |rel, entry| {
        fsutil::is_hidden(rel) || (entry.file_type().is_file() && entry.file_name() == manifest_name)
    })?;
    debug!("Overlaid {} files from {} into {}", files.len(), from.display(), to.display());

    FileManifest { files }.save(to, manifest_name)
}
