//! Local filesystem backends

use crate::error::{ModcacheError, ModcacheResult};
use crate::fetch::{Fetcher, FetcherSet};
use crate::fsutil;
use crate::source::SourceUrl;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copies a local directory into the destination, byte for byte.
///
/// Never creates symbolic or hard links: links in the source are followed
/// and their targets copied, so the wrapped tool can not write back into the
/// operator's tree and cache invalidation can not leave dangling links.
/// The destination is emptied first, so files removed from the source do not
/// survive in the copy.
pub struct FileCopyFetcher;

#[async_trait]
impl Fetcher for FileCopyFetcher {
    async fn fetch(&self, _fetchers: &FetcherSet, url: &SourceUrl, dest: &Path) -> ModcacheResult<()> {
        let src = local_dir(url)?;
        let dest = dest.to_path_buf();
        let url_str = url.to_string();

        debug!("Copying {} into {}", src.display(), dest.display());
        let copied = tokio::task::spawn_blocking(move || {
            fsutil::clear_path(&dest)?;
            fsutil::copy_tree(&src, &dest, |_, _| false)
        })
        .await
        .map_err(|e| ModcacheError::Internal(format!("copy task failed: {}", e)))?
        .map_err(|source| ModcacheError::FetchIo {
            url: url_str,
            source,
        })?;

        debug!("Copied {} files", copied.len());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file-copy"
    }
}

/// Links the destination to the local source directory.
///
/// This is the platform default; acquisitions replace it with
/// [`FileCopyFetcher`].
pub struct FileLinkFetcher;

#[async_trait]
impl Fetcher for FileLinkFetcher {
    async fn fetch(&self, _fetchers: &FetcherSet, url: &SourceUrl, dest: &Path) -> ModcacheResult<()> {
        let src = local_dir(url)?;
        let io_err = |source: std::io::Error| ModcacheError::FetchIo {
            url: url.to_string(),
            source,
        };

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        fsutil::clear_path(dest).map_err(io_err)?;

        link_dir(&src, dest).map_err(io_err)
    }

    fn name(&self) -> &'static str {
        "file-link"
    }
}

#[cfg(unix)]
fn link_dir(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dest)
}

#[cfg(windows)]
fn link_dir(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dest)
}

fn local_dir(url: &SourceUrl) -> ModcacheResult<PathBuf> {
    let path = url
        .to_file_path()
        .ok_or_else(|| ModcacheError::fetch(url.to_string(), "not a local file URL"))?;

    if !path.is_dir() {
        return Err(ModcacheError::fetch(
            url.to_string(),
            format!("source directory {} does not exist", path.display()),
        ));
    }
    Ok(path)
}
