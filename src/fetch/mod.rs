//! Fetch backends
//!
//! A [`Fetcher`] transfers one source URL into a destination directory. Backends
//! are looked up by protocol name in a [`FetcherSet`].
//!
//! The platform defaults are built once and never mutated. Every acquisition
//! derives its own set from them with [`FetcherSet::with_file_copy`], which
//! swaps the linking `file` backend for one that copies bytes. Backends that
//! delegate to another source (HTTP redirects via `X-Terraform-Get`) dispatch
//! through the same per-acquisition set, so nested local fetches copy as well.

pub mod file;
pub mod git;
pub mod http;

pub use file::{FileCopyFetcher, FileLinkFetcher};
pub use git::GitFetcher;
pub use http::HttpFetcher;

use crate::error::{ModcacheError, ModcacheResult};
use crate::source::{SourceUrl, FILE_PROTOCOL};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Transfer strategy for one protocol
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` into `dest`.
    ///
    /// `fetchers` is the set this backend was selected from, for backends that
    /// need to hand off to another protocol.
    async fn fetch(&self, fetchers: &FetcherSet, url: &SourceUrl, dest: &Path) -> ModcacheResult<()>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

static PLATFORM_DEFAULTS: LazyLock<FetcherSet> = LazyLock::new(|| {
    let http: Arc<dyn Fetcher> = Arc::new(HttpFetcher);
    FetcherSet::new()
        .with(FILE_PROTOCOL, Arc::new(FileLinkFetcher))
        .with("git", Arc::new(GitFetcher))
        .with("http", Arc::clone(&http))
        .with("https", http)
});

/// Protocol name to backend mapping
#[derive(Clone, Default)]
pub struct FetcherSet {
    fetchers: HashMap<String, Arc<dyn Fetcher>>,
}

impl FetcherSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared, read-only default backends
    pub fn platform_defaults() -> &'static FetcherSet {
        &PLATFORM_DEFAULTS
    }

    /// Add or replace the backend for a protocol
    pub fn with(mut self, protocol: &str, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetchers.insert(protocol.to_ascii_lowercase(), fetcher);
        self
    }

    /// A fresh copy of `base` whose `file` backend copies instead of linking
    pub fn with_file_copy(base: &FetcherSet) -> FetcherSet {
        let fetchers = base
            .fetchers
            .iter()
            .map(|(name, fetcher)| {
                let fetcher = if name == FILE_PROTOCOL {
                    Arc::new(FileCopyFetcher) as Arc<dyn Fetcher>
                } else {
                    Arc::clone(fetcher)
                };
                (name.clone(), fetcher)
            })
            .collect();
        FetcherSet { fetchers }
    }

    /// Backend registered for a protocol
    pub fn get(&self, protocol: &str) -> Option<&Arc<dyn Fetcher>> {
        self.fetchers.get(&protocol.to_ascii_lowercase())
    }

    /// Registered protocol names, sorted
    pub fn protocols(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fetchers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Download `url` into `dest` with the backend for its protocol
    pub async fn fetch(&self, url: &SourceUrl, dest: &Path) -> ModcacheResult<()> {
        let fetcher = self
            .get(url.protocol())
            .ok_or_else(|| ModcacheError::UnsupportedProtocol(url.protocol().to_string()))?;

        debug!("Fetching {} with {} backend", url, fetcher.name());
        fetcher.fetch(self, url, dest).await
    }
}

impl std::fmt::Debug for FetcherSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<(&str, &str)> = self
            .protocols()
            .into_iter()
            .filter_map(|p| self.get(p).map(|fetcher| (p, fetcher.name())))
            .collect();
        f.debug_map().entries(entries).finish()
    }
}
