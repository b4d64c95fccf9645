//! Status command - show the resolved source and cache state of a module

use crate::cache;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::cli::{load_module, module_dir};
use crate::error::ModcacheResult;
use crate::source::SourceDescriptor;
use console::{style, Emoji};
use serde::Serialize;
use std::path::{Path, PathBuf};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

#[derive(Serialize)]
struct StatusReport {
    module_dir: PathBuf,
    source: Option<String>,
    canonical_url: Option<String>,
    download_dir: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    version: Option<String>,
    cached_version: Option<String>,
    needs_fetch: bool,
    reason: String,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config_path: Option<&Path>) -> ModcacheResult<()> {
    let dir = module_dir(args.dir.as_deref())?;
    let (config, mut opts) = load_module(&dir, config_path, args.download_dir.as_deref()).await?;
    if args.source.is_some() {
        opts.source = args.source.clone();
    }

    let report = match opts.source_url(&config) {
        None => StatusReport {
            module_dir: dir,
            source: None,
            canonical_url: None,
            download_dir: None,
            working_dir: None,
            version: None,
            cached_version: None,
            needs_fetch: false,
            reason: "no module source configured".to_string(),
        },
        Some(raw) => {
            let source = SourceDescriptor::resolve(&raw, &opts)?;
            let decision = cache::check(&source, false, &config.cache.config_extensions).await?;
            StatusReport {
                module_dir: dir,
                canonical_url: Some(source.canonical_url.to_string()),
                version: Some(source.encode_version()),
                cached_version: source.read_version_file().await.ok(),
                download_dir: Some(source.download_dir),
                working_dir: Some(source.working_dir),
                needs_fetch: decision.needs_fetch(),
                reason: decision.to_string(),
                source: Some(raw),
            }
        }
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &StatusReport) {
    println!("{}", style("Module Source Status").bold().cyan());
    println!();
    println!("  {:<15} {}", "Module dir:", report.module_dir.display());

    let Some(ref source) = report.source else {
        println!("  {}{}", WARN, report.reason);
        return;
    };

    println!("  {:<15} {}", "Source:", source);
    let rows = [
        ("Canonical URL:", report.canonical_url.clone()),
        ("Download dir:", report.download_dir.as_ref().map(|p| p.display().to_string())),
        ("Working dir:", report.working_dir.as_ref().map(|p| p.display().to_string())),
        ("Version:", report.version.clone()),
        ("Cached version:", report.cached_version.clone()),
    ];
    for (label, value) in rows {
        let value = value.unwrap_or_else(|| style("none").dim().to_string());
        println!("  {:<15} {}", label, value);
    }

    println!();
    if report.needs_fetch {
        println!("  {}{} ({})", WARN, style("Fetch needed").yellow(), report.reason);
    } else {
        println!("  {}{}", CHECK, style("Cache up to date").green());
    }
}
