//! Git backend
//!
//! Shells out to the `git` CLI. Supported query parameters:
//! - `ref`: branch, tag or commit to check out
//! - `depth`: shallow clone depth (requires `ref` to be a branch or tag)

use crate::error::{ModcacheError, ModcacheResult};
use crate::fetch::{Fetcher, FetcherSet};
use crate::source::SourceUrl;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Query parameters consumed by this backend (not passed on to git)
const GIT_PARAMS: &[&str] = &["ref", "depth"];

/// Clones git repositories
pub struct GitFetcher;

#[async_trait]
impl Fetcher for GitFetcher {
    async fn fetch(&self, _fetchers: &FetcherSet, url: &SourceUrl, dest: &Path) -> ModcacheResult<()> {
        let git_ref = url.query_value("ref");
        let depth = match url.query_value("depth") {
            Some(d) => Some(d.parse::<u32>().map_err(|_| {
                ModcacheError::fetch(url.to_string(), format!("invalid depth '{}'", d))
            })?),
            None => None,
        };
        let remote = url.without_query_keys(GIT_PARAMS).url().to_string();

        // git refuses to clone into a non-empty directory
        debug!("Clearing {}", dest.display());
        crate::fsutil::clear_path(dest)
            .map_err(|e| ModcacheError::io(format!("removing {}", dest.display()), e))?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ModcacheError::io(format!("creating {}", parent.display()), e))?;
        }

        let dest_str = dest.to_string_lossy().into_owned();
        let args = clone_args(&remote, &dest_str, git_ref.as_deref(), depth);
        info!("git clone {}", remote);
        run_git(url, &args[..]).await?;

        // Without a depth the ref may be a commit, which `--branch` can not name
        if let (Some(r), None) = (git_ref.as_deref(), depth) {
            run_git(url, &["-C", dest_str.as_str(), "checkout", "--quiet", r]).await?;
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "git"
    }
}

fn clone_args(remote: &str, dest: &str, git_ref: Option<&str>, depth: Option<u32>) -> Vec<String> {
    let mut args = vec!["clone".to_string(), "--quiet".to_string()];
    if let Some(depth) = depth {
        args.push("--depth".to_string());
        args.push(depth.to_string());
        if let Some(r) = git_ref {
            args.push("--branch".to_string());
            args.push(r.to_string());
        }
    }
    args.push("--".to_string());
    args.push(remote.to_string());
    args.push(dest.to_string());
    args
}

async fn run_git<S: AsRef<str>>(url: &SourceUrl, args: &[S]) -> ModcacheResult<()> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    debug!("Executing: git {:?}", args);

    let output = Command::new("git")
        .args(&args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ModcacheError::command_failed(format!("git {:?}", args), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ModcacheError::fetch(
            url.to_string(),
            format!("git {} failed: {}", args[0], stderr.trim()),
        ));
    }
    Ok(())
}
