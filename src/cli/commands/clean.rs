//! Clean command - remove cached downloads of a module
//!
//! Only the module's own directory under the cache root is removed, so
//! modules sharing a cache root keep their downloads.

use crate::cli::args::CleanArgs;
use crate::cli::{load_module, module_dir};
use crate::error::{ModcacheError, ModcacheResult};
use crate::source::SourceDescriptor;
use console::style;
use std::io;
use std::path::Path;
use tracing::info;

/// Execute the clean command
pub async fn execute(args: CleanArgs, config_path: Option<&Path>) -> ModcacheResult<()> {
    let dir = module_dir(args.dir.as_deref())?;
    let (_, opts) = load_module(&dir, config_path, args.download_dir.as_deref()).await?;
    let target = SourceDescriptor::module_cache_dir(&opts)?;

    info!("Removing module cache {}", target.display());
    match tokio::fs::remove_dir_all(&target).await {
        Ok(()) => println!("{} Removed {}", style("✓").green(), target.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            println!("Nothing to clean at {}", target.display())
        }
        Err(e) => {
            return Err(ModcacheError::CacheInvalidation {
                path: target,
                source: e,
            })
        }
    }
    Ok(())
}
