//! HTTP(S) backend
//!
//! A GET on the source URL either returns the module itself or redirects to
//! another source through the `X-Terraform-Get` header. Redirect targets are
//! fetched through the calling [`FetcherSet`], so a `file` target is copied
//! with the same backend a top-level local source would use.
//!
//! Bodies ending in `.tar.gz`/`.tgz` are unpacked into the destination; link
//! entries inside archives are skipped. Other bodies are saved as one file.

use crate::error::{ModcacheError, ModcacheResult};
use crate::fetch::{Fetcher, FetcherSet};
use crate::fsutil;
use crate::source::SourceUrl;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

/// Header used by module registries to point at the real source
pub const TERRAFORM_GET_HEADER: &str = "X-Terraform-Get";

/// Maximum number of `X-Terraform-Get` hops followed from one URL
const MAX_REDIRECTS: usize = 5;

/// Downloads over HTTP(S) with `ureq`
pub struct HttpFetcher;

/// What a GET produced
enum Response {
    /// The server pointed at another source
    Redirect(String),
    /// The body was written into the destination
    Written,
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, fetchers: &FetcherSet, url: &SourceUrl, dest: &Path) -> ModcacheResult<()> {
        let mut current = url.clone();

        for _ in 0..=MAX_REDIRECTS {
            let target = current.url().clone();
            let dest_buf = dest.to_path_buf();
            info!("Downloading {}", target);

            let response = tokio::task::spawn_blocking(move || get(&target, &dest_buf))
                .await
                .map_err(|e| ModcacheError::Internal(format!("download task failed: {}", e)))?
                .map_err(|reason| ModcacheError::fetch(current.to_string(), reason))?;

            let location = match response {
                Response::Written => return Ok(()),
                Response::Redirect(location) => location,
            };

            let next = resolve_redirect(&current, &location)?;
            debug!("{} redirected to {}", current, next);

            if !matches!(next.protocol(), "http" | "https") || next.forced().is_some() {
                return fetchers.fetch(&next, dest).await;
            }
            current = next;
        }

        Err(ModcacheError::fetch(
            url.to_string(),
            format!("more than {} {} redirects", MAX_REDIRECTS, TERRAFORM_GET_HEADER),
        ))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Resolve an `X-Terraform-Get` value against the URL that returned it
fn resolve_redirect(from: &SourceUrl, location: &str) -> ModcacheResult<SourceUrl> {
    let location = location.trim();
    if location.starts_with("./") || location.starts_with("../") || location.starts_with('/') {
        let joined = from
            .url()
            .join(location)
            .map_err(|e| ModcacheError::fetch(from.to_string(), e.to_string()))?;
        return Ok(SourceUrl::new(None, joined));
    }

    SourceUrl::parse(location, Path::new("/")).map_err(|e| {
        ModcacheError::fetch(
            from.to_string(),
            format!("invalid {} target: {}", TERRAFORM_GET_HEADER, e),
        )
    })
}

fn get(url: &Url, dest: &Path) -> Result<Response, String> {
    let response = ureq::get(url.as_str()).call().map_err(|e| e.to_string())?;

    if let Some(location) = response
        .headers()
        .get(TERRAFORM_GET_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Ok(Response::Redirect(location.to_string()));
    }

    write_body(url, response.into_body().into_reader(), dest)?;
    Ok(Response::Written)
}

/// Replace the contents of `dest` with a downloaded body
fn write_body<R: Read>(url: &Url, mut reader: R, dest: &Path) -> Result<(), String> {
    fsutil::clear_path(dest).map_err(|e| format!("clearing {}: {}", dest.display(), e))?;
    fs::create_dir_all(dest).map_err(|e| format!("creating {}: {}", dest.display(), e))?;

    if is_tarball(url) {
        return unpack_tarball(reader, dest).map_err(|e| format!("unpacking archive: {}", e));
    }

    let name = file_name(url);
    let mut file =
        fs::File::create(dest.join(&name)).map_err(|e| format!("creating {}: {}", name, e))?;
    io::copy(&mut reader, &mut file).map_err(|e| format!("writing {}: {}", name, e))?;
    Ok(())
}

fn is_tarball(url: &Url) -> bool {
    let path = url.path();
    path.ends_with(".tar.gz") || path.ends_with(".tgz")
}

fn file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back().map(str::to_string))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "download".to_string())
}

/// Unpack a gzipped tarball, skipping symbolic and hard links
fn unpack_tarball<R: Read>(reader: R, dest: &Path) -> io::Result<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    for entry in archive.entries()? {
        let mut entry = entry?;
        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            warn!("Skipping link {} in archive", entry.path()?.display());
            continue;
        }
        entry.unpack_in(dest)?;
    }
    Ok(())
}
