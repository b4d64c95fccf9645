//! Fetch command - acquire module sources

use crate::acquire::{Acquirer, Acquisition};
use crate::cli::args::FetchArgs;
use crate::cli::{load_module, module_dir};
use crate::error::{ModcacheError, ModcacheResult};
use console::style;
use futures_util::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config_path: Option<&Path>) -> ModcacheResult<()> {
    let dirs = if args.dirs.is_empty() {
        vec![module_dir(None)?]
    } else {
        args.dirs.clone()
    };

    let acquirer = Acquirer::new();
    let spinner = create_spinner(&format!("Fetching {} module(s)...", dirs.len()));

    let mut results = join_all(
        dirs.iter()
            .map(|dir| fetch_one(&acquirer, &args, dir, config_path)),
    )
    .await;
    spinner.finish_and_clear();

    // A single failing module reports its own error (and hint)
    if let [Err(_)] = results.as_slice() {
        if let Some(Err(e)) = results.pop() {
            return Err(e);
        }
    }

    let mut failed = 0;
    for (dir, result) in dirs.iter().zip(results) {
        match result {
            Ok(Some((acquisition, working_dir))) => {
                let how = if acquisition.fetched() {
                    style("downloaded").green()
                } else {
                    style("cached").dim()
                };
                println!(
                    "{} {} -> {} ({})",
                    style("✓").green(),
                    dir.display(),
                    working_dir.display(),
                    how
                );
            }
            Ok(None) => {
                println!(
                    "{} {}: no module source configured",
                    style("-").dim(),
                    dir.display()
                );
            }
            Err(e) => {
                println!("{} {}: {}", style("✗").red(), dir.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(ModcacheError::User(format!(
            "{} of {} modules failed",
            failed,
            dirs.len()
        )));
    }
    Ok(())
}

async fn fetch_one(
    acquirer: &Acquirer,
    args: &FetchArgs,
    dir: &Path,
    config_path: Option<&Path>,
) -> ModcacheResult<Option<(Acquisition, PathBuf)>> {
    let (config, mut opts) = load_module(dir, config_path, args.download_dir.as_deref()).await?;
    if args.source.is_some() {
        opts.source = args.source.clone();
    }
    opts.source_update = args.source_update;

    debug!("Acquiring {} with {:?}", dir.display(), opts);
    let acquisition = acquirer.acquire(&mut opts, &config).await?;
    Ok(acquisition.map(|a| (a, opts.working_dir)))
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
