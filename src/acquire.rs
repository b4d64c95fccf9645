//! Module source acquisition
//!
//! Ties the pieces together for one module directory:
//!
//! 1. resolve the source reference into a [`SourceDescriptor`]
//! 2. drop the cached copy when an update is forced
//! 3. ask the cache whether a download is needed
//! 4. download through the hook pipeline with a fresh backend set
//! 5. record the downloaded version
//! 6. overlay the module directory onto the download
//! 7. repoint the run at the downloaded working directory
//!
//! Each step only starts after the previous one succeeded, so an interrupted
//! run never leaves a version marker behind for an incomplete download.

use crate::cache::{self, CacheDecision};
use crate::config::Config;
use crate::error::{ModcacheError, ModcacheResult};
use crate::fetch::FetcherSet;
use crate::hooks;
use crate::options::RunOptions;
use crate::overlay;
use crate::source::SourceDescriptor;
use std::io;
use tracing::{debug, info};

/// Command name hooks see while a source is being downloaded
pub const INIT_FROM_MODULE: &str = "init-from-module";

/// Manifest the overlay keeps in the working directory
pub const MODULE_MANIFEST_NAME: &str = ".modcache-module-manifest";

/// Outcome of a completed acquisition
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// The resolved source
    pub source: SourceDescriptor,

    /// Why the cache was or was not reused
    pub decision: CacheDecision,
}

impl Acquisition {
    /// Whether the source was downloaded during this acquisition
    pub fn fetched(&self) -> bool {
        self.decision.needs_fetch()
    }
}

/// Downloads module sources into the cache
///
/// Holds the read-only backend set acquisitions start from. Every download
/// builds its own copy with the `file` backend replaced, so one `Acquirer`
/// can serve concurrent acquisitions.
#[derive(Debug, Clone)]
pub struct Acquirer {
    base: FetcherSet,
}

impl Default for Acquirer {
    fn default() -> Self {
        Self::new()
    }
}

impl Acquirer {
    /// Acquirer over the platform default backends
    pub fn new() -> Self {
        Self::with_fetchers(FetcherSet::platform_defaults().clone())
    }

    /// Acquirer over a custom backend set
    pub fn with_fetchers(base: FetcherSet) -> Self {
        Self { base }
    }

    /// Acquire the configured source for `opts.working_dir`.
    ///
    /// Returns `None` without touching the filesystem when neither the options
    /// nor the configuration name a source. On success `opts.working_dir`
    /// points at the downloaded working directory; on failure it is unchanged.
    pub async fn acquire(
        &self,
        opts: &mut RunOptions,
        config: &Config,
    ) -> ModcacheResult<Option<Acquisition>> {
        let Some(raw) = opts.source_url(config) else {
            debug!("No module source configured, nothing to download");
            return Ok(None);
        };

        let source = SourceDescriptor::resolve(&raw, opts)?;
        debug!("Resolved {} to {}", raw, source.canonical_url);

        if opts.source_update {
            info!(
                "Removing cached copy at {} (update forced)",
                source.download_dir.display()
            );
            remove_download_dir(&source).await?;
        }

        let decision =
            cache::check(&source, opts.source_update, &config.cache.config_extensions).await?;

        if decision.needs_fetch() {
            info!(
                "Downloading {} into {} ({})",
                source.canonical_url,
                source.download_dir.display(),
                decision
            );
            self.download(&source, opts, config).await?;

            debug!("Recording version in {}", source.version_file.display());
            source.write_version_file().await?;
        } else {
            info!(
                "Using cached copy of {} at {}",
                source.canonical_url,
                source.download_dir.display()
            );
        }

        info!(
            "Copying files from {} into {}",
            opts.working_dir.display(),
            source.working_dir.display()
        );
        overlay::copy_folder_contents(&opts.working_dir, &source.working_dir, MODULE_MANIFEST_NAME)
            .await?;

        info!("Setting working directory to {}", source.working_dir.display());
        opts.working_dir = source.working_dir.clone();

        Ok(Some(Acquisition { source, decision }))
    }

    /// Download `source` wrapped in the `init-from-module` hooks
    async fn download(
        &self,
        source: &SourceDescriptor,
        opts: &RunOptions,
        config: &Config,
    ) -> ModcacheResult<()> {
        let fetchers = FetcherSet::with_file_copy(&self.base);
        let hook_opts = opts.with_command(INIT_FROM_MODULE);

        let fetchers = &fetchers;
        hooks::run_action_with_hooks("download source", &hook_opts, config, move || async move {
            fetchers
                .fetch(&source.canonical_url, &source.download_dir)
                .await
        })
        .await
        .map_err(ModcacheError::fetch_aborted)
    }
}

async fn remove_download_dir(source: &SourceDescriptor) -> ModcacheResult<()> {
    match tokio::fs::remove_dir_all(&source.download_dir).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(ModcacheError::CacheInvalidation {
            path: source.download_dir.clone(),
            source: e,
        }),
        _ => Ok(()),
    }
}
