//! Integration tests for modcache

use std::fs;
use std::path::Path;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A module tree under `modules/vpc` and an operator directory `live`
fn workspace() -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().unwrap();
    write(&dir.path().join("modules/vpc/main.tf"), "resource \"null\" \"x\" {}");
    write(&dir.path().join("live/terraform.tfvars"), "cidr = \"10.0.0.0/16\"");
    dir
}

mod cli_tests {
    use super::*;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use modcache::options::RunOptions;
    use modcache::source::SourceDescriptor;
    use predicates::prelude::*;
    use std::path::PathBuf;

    fn modcache() -> Command {
        let mut cmd = cargo_bin_cmd!("modcache");
        cmd.env_remove("MODCACHE_CONFIG")
            .env_remove("MODCACHE_SOURCE")
            .env_remove("MODCACHE_DOWNLOAD_DIR");
        cmd
    }

    #[test]
    fn help_displays() {
        modcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("module source cache"));
    }

    #[test]
    fn version_displays() {
        modcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("modcache"));
    }

    #[test]
    fn fetch_help() {
        modcache()
            .args(["fetch", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--source-update"));
    }

    #[test]
    fn fetch_local_source_overlays_module_dir() {
        let ws = workspace();
        let live = ws.path().join("live");

        modcache()
            .args(["fetch", "--source", "../modules/vpc"])
            .arg(&live)
            .assert()
            .success()
            .stdout(predicate::str::contains("downloaded"));

        let mut opts = RunOptions::new(&live);
        opts.source = Some("../modules/vpc".to_string());
        let source = SourceDescriptor::resolve("../modules/vpc", &opts).unwrap();

        assert!(source.working_dir.join("main.tf").is_file());
        assert_eq!(
            fs::read_to_string(source.working_dir.join("terraform.tfvars")).unwrap(),
            "cidr = \"10.0.0.0/16\""
        );
        assert!(source.version_file.is_file());
    }

    #[test]
    fn fetch_uses_configured_source() {
        let ws = workspace();
        write(
            &ws.path().join("live/modcache.toml"),
            "[module]\nsource = \"../modules/vpc\"\n",
        );

        modcache()
            .current_dir(ws.path().join("live"))
            .arg("fetch")
            .assert()
            .success()
            .stdout(predicate::str::contains("downloaded"));

        assert!(ws.path().join("live/.modcache").is_dir());
    }

    #[test]
    fn fetch_without_source_is_a_noop() {
        let ws = workspace();

        modcache()
            .args(["fetch"])
            .arg(ws.path().join("live"))
            .assert()
            .success()
            .stdout(predicate::str::contains("no module source configured"));

        assert!(!ws.path().join("live/.modcache").exists());
    }

    #[test]
    fn fetch_unsupported_protocol_fails_with_hint() {
        let ws = workspace();

        modcache()
            .args(["fetch", "--source", "s3::https://bucket.example/mod.zip"])
            .arg(ws.path().join("live"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("s3"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn fetch_missing_module_dir_fails() {
        modcache()
            .args(["fetch", "/nonexistent/modcache/module"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("module directory not found"));
    }

    #[test]
    fn fetch_malformed_source_fails() {
        let ws = workspace();

        modcache()
            .args(["fetch", "--source", "not a url"])
            .arg(ws.path().join("live"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid module source"));
    }

    #[cfg(unix)]
    #[test]
    fn fetch_runs_download_hooks() {
        let ws = workspace();
        write(
            &ws.path().join("live/modcache.toml"),
            r#"
[module]
source = "../modules/vpc"

[[hooks.before]]
name = "announce"
commands = ["init-from-module"]
execute = ["sh", "-c", "echo $MODCACHE_COMMAND > .hook-ran"]

[[hooks.before]]
name = "plan-only"
commands = ["plan"]
execute = ["sh", "-c", "touch .plan-ran"]
"#,
        );

        modcache()
            .arg("fetch")
            .arg(ws.path().join("live"))
            .assert()
            .success();

        let ran = fs::read_to_string(ws.path().join("live/.hook-ran")).unwrap();
        assert_eq!(ran.trim(), "init-from-module");
        assert!(!ws.path().join("live/.plan-ran").exists());
    }

    #[cfg(unix)]
    #[test]
    fn failing_hook_aborts_fetch() {
        let ws = workspace();
        write(
            &ws.path().join("live/modcache.toml"),
            r#"
[module]
source = "../modules/vpc"

[[hooks.before]]
name = "deny"
commands = ["init-from-module"]
execute = ["sh", "-c", "exit 7"]
"#,
        );

        modcache()
            .arg("fetch")
            .arg(ws.path().join("live"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Hook 'deny' failed"));
    }

    #[test]
    fn status_reports_pending_fetch() {
        let ws = workspace();

        modcache()
            .args(["status", "--format", "json", "--source"])
            .arg("git::https://example.com/mod.git//vpc?ref=v1")
            .arg(ws.path().join("live"))
            .assert()
            .success()
            .stdout(predicate::str::contains("\"needs_fetch\": true"))
            .stdout(predicate::str::contains("git::https://example.com/mod.git?ref=v1"));
    }

    #[test]
    fn status_without_source() {
        let ws = workspace();

        modcache()
            .arg("status")
            .arg(ws.path().join("live"))
            .assert()
            .success()
            .stdout(predicate::str::contains("no module source configured"));
    }

    #[test]
    fn clean_removes_module_cache() {
        let ws = workspace();
        let live = ws.path().join("live");

        modcache()
            .args(["fetch", "--source", "../modules/vpc"])
            .arg(&live)
            .assert()
            .success();
        assert!(live.join(".modcache").is_dir());

        modcache()
            .arg("clean")
            .arg(&live)
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed"));
        assert_eq!(fs::read_dir(live.join(".modcache")).unwrap().count(), 0);

        modcache()
            .arg("clean")
            .arg(&live)
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to clean"));
    }

    #[test]
    fn clean_keeps_other_modules_in_shared_root() {
        let ws = workspace();
        let shared = ws.path().join(".shared");
        for name in ["a", "b"] {
            write(&ws.path().join(name).join("terraform.tfvars"), name);
            modcache()
                .args(["fetch", "--source", "../modules/vpc", "--download-dir", "../.shared"])
                .arg(ws.path().join(name))
                .assert()
                .success();
        }
        assert_eq!(fs::read_dir(&shared).unwrap().count(), 2);

        modcache()
            .args(["clean", "--download-dir", "../.shared"])
            .arg(ws.path().join("a"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed"));

        let left: Vec<_> = fs::read_dir(&shared).unwrap().collect();
        assert_eq!(left.len(), 1);

        let b_files = walk_files(&left[0].as_ref().unwrap().path());
        assert!(b_files.iter().any(|p| p.ends_with("terraform.tfvars")));
    }

    fn walk_files(root: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    out.push(path);
                }
            }
        }
        out
    }

    #[test]
    fn explicit_missing_config_fails() {
        let ws = workspace();

        modcache()
            .args(["--config", "/nonexistent/modcache.toml", "status"])
            .arg(ws.path().join("live"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"));
    }
}

mod acquisition_tests {
    use super::*;
    use async_trait::async_trait;
    use modcache::acquire::{Acquirer, MODULE_MANIFEST_NAME};
    use modcache::cache::{self, CacheDecision};
    use modcache::config::Config;
    use modcache::error::ModcacheResult;
    use modcache::fetch::{Fetcher, FetcherSet, FileLinkFetcher};
    use modcache::options::RunOptions;
    use modcache::source::{SourceDescriptor, SourceUrl};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stands in for the git backend: writes one module file per call
    #[derive(Default)]
    struct CountingGit {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for CountingGit {
        async fn fetch(&self, _: &FetcherSet, url: &SourceUrl, dest: &Path) -> ModcacheResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            write(&dest.join("modules/vpc/main.tf"), &url.to_string());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "counting-git"
        }
    }

    /// Stands in for a registry: hands the download off to a `file` URL
    struct Registry {
        target: String,
    }

    #[async_trait]
    impl Fetcher for Registry {
        async fn fetch(&self, fetchers: &FetcherSet, _: &SourceUrl, dest: &Path) -> ModcacheResult<()> {
            let next = SourceUrl::parse(&self.target, Path::new("/"))?;
            fetchers.fetch(&next, dest).await
        }

        fn name(&self) -> &'static str {
            "registry"
        }
    }

    const SOURCE: &str = "git::https://example.com/mod.git//modules/vpc?ref=v1";

    fn options(dir: &Path, source: &str) -> RunOptions {
        let mut opts = RunOptions::new(dir);
        opts.source = Some(source.to_string());
        opts
    }

    fn counting_acquirer() -> (Arc<CountingGit>, Acquirer) {
        let git = Arc::new(CountingGit::default());
        let acquirer = Acquirer::with_fetchers(FetcherSet::new().with("git", git.clone()));
        (git, acquirer)
    }

    #[tokio::test]
    async fn remote_source_is_fetched_once() {
        let ws = workspace();
        let live = ws.path().join("live");
        let (git, acquirer) = counting_acquirer();
        let config = Config::default();

        let mut first = options(&live, SOURCE);
        let acquisition = acquirer.acquire(&mut first, &config).await.unwrap().unwrap();
        assert!(acquisition.fetched());
        assert_eq!(first.working_dir, acquisition.source.working_dir);
        assert_eq!(
            fs::read_to_string(&acquisition.source.version_file).unwrap().trim(),
            acquisition.source.encode_version()
        );

        let mut second = options(&live, SOURCE);
        let again = acquirer.acquire(&mut second, &config).await.unwrap().unwrap();
        assert_eq!(again.decision, CacheDecision::UpToDate);
        assert_eq!(second.working_dir, first.working_dir);
        assert_eq!(git.calls.load(Ordering::SeqCst), 1);

        // The overlay is re-applied on a cache hit
        write(&live.join("extra.tf"), "# added later");
        let mut third = options(&live, SOURCE);
        acquirer.acquire(&mut third, &config).await.unwrap();
        assert!(third.working_dir.join("extra.tf").is_file());
        assert_eq!(git.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn new_ref_fetches_again() {
        let ws = workspace();
        let live = ws.path().join("live");
        let (git, acquirer) = counting_acquirer();
        let config = Config::default();

        acquirer
            .acquire(&mut options(&live, SOURCE), &config)
            .await
            .unwrap();
        let v2 = acquirer
            .acquire(
                &mut options(&live, "git::https://example.com/mod.git//modules/vpc?ref=v2"),
                &config,
            )
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(v2.decision, CacheDecision::VersionChanged { .. }));
        assert_eq!(git.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            fs::read_to_string(&v2.source.version_file).unwrap().trim(),
            v2.source.encode_version()
        );
    }

    #[tokio::test]
    async fn forced_update_removes_cached_copy() {
        let ws = workspace();
        let live = ws.path().join("live");
        let (git, acquirer) = counting_acquirer();
        let config = Config::default();

        let first = acquirer
            .acquire(&mut options(&live, SOURCE), &config)
            .await
            .unwrap()
            .unwrap();
        let stale = first.source.download_dir.join("stale.tf");
        write(&stale, "# left over");

        let mut forced = options(&live, SOURCE);
        forced.source_update = true;
        acquirer.acquire(&mut forced, &config).await.unwrap();

        assert!(!stale.exists());
        assert_eq!(git.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn removed_operator_files_are_pruned() {
        let ws = workspace();
        let live = ws.path().join("live");
        let (_, acquirer) = counting_acquirer();
        let config = Config::default();
        write(&live.join("override.tf"), "# temporary");

        let mut first = options(&live, SOURCE);
        acquirer.acquire(&mut first, &config).await.unwrap();
        assert!(first.working_dir.join("override.tf").is_file());
        assert!(first.working_dir.join(MODULE_MANIFEST_NAME).is_file());

        fs::remove_file(live.join("override.tf")).unwrap();
        let mut second = options(&live, SOURCE);
        acquirer.acquire(&mut second, &config).await.unwrap();

        assert!(!second.working_dir.join("override.tf").exists());
        assert!(second.working_dir.join("main.tf").is_file());
    }

    #[tokio::test]
    async fn local_source_is_always_stale() {
        let ws = workspace();
        let live = ws.path().join("live");
        let opts = options(&live, "../modules/vpc");
        let source = SourceDescriptor::resolve("../modules/vpc", &opts).unwrap();
        let extensions = Config::default().cache.config_extensions;

        for _ in 0..2 {
            Acquirer::new()
                .acquire(&mut opts.clone(), &Config::default())
                .await
                .unwrap();
            assert!(cache::should_fetch(&source, false, &extensions).await.unwrap());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_are_copied_not_linked() {
        let ws = workspace();
        write(&ws.path().join("shared/variables.tf"), "variable \"region\" {}");
        std::os::unix::fs::symlink(
            ws.path().join("shared/variables.tf"),
            ws.path().join("modules/vpc/variables.tf"),
        )
        .unwrap();
        std::os::unix::fs::symlink(ws.path().join("shared"), ws.path().join("modules/vpc/shared"))
            .unwrap();

        let mut opts = options(&ws.path().join("live"), "../modules/vpc");
        Acquirer::new()
            .acquire(&mut opts, &Config::default())
            .await
            .unwrap();

        for copied in ["variables.tf", "shared", "shared/variables.tf"] {
            let meta = fs::symlink_metadata(opts.working_dir.join(copied)).unwrap();
            assert!(!meta.file_type().is_symlink(), "{} is a link", copied);
        }

        // Editing the copy leaves the operator's tree untouched
        fs::write(opts.working_dir.join("variables.tf"), "changed").unwrap();
        assert_eq!(
            fs::read_to_string(ws.path().join("shared/variables.tf")).unwrap(),
            "variable \"region\" {}"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nested_file_fetch_copies_too() {
        let ws = workspace();
        let module = ws.path().join("modules/vpc");
        let target = url::Url::from_directory_path(&module).unwrap().to_string();

        let base = FetcherSet::new()
            .with("file", Arc::new(FileLinkFetcher))
            .with("https", Arc::new(Registry { target }));
        let mut opts = options(
            &ws.path().join("live"),
            "https://registry.example.com/v1/modules/vpc/download",
        );

        Acquirer::with_fetchers(base)
            .acquire(&mut opts, &Config::default())
            .await
            .unwrap();

        let meta = fs::symlink_metadata(&opts.working_dir).unwrap();
        assert!(!meta.file_type().is_symlink());
        assert!(opts.working_dir.join("main.tf").is_file());
    }

    #[tokio::test]
    async fn concurrent_acquisitions_do_not_interfere() {
        let ws = workspace();
        let (git, acquirer) = counting_acquirer();
        let config = Config::default();
        let dirs: Vec<_> = (0..4)
            .map(|i| {
                let dir = ws.path().join(format!("live-{}", i));
                write(&dir.join("terraform.tfvars"), &format!("index = {}", i));
                dir
            })
            .collect();

        let results = futures_util::future::join_all(dirs.iter().map(|dir| {
            let acquirer = &acquirer;
            let config = &config;
            async move {
                let mut opts = options(dir, SOURCE);
                acquirer.acquire(&mut opts, config).await.map(|_| opts.working_dir)
            }
        }))
        .await;

        assert_eq!(git.calls.load(Ordering::SeqCst), 4);
        for (i, result) in results.into_iter().enumerate() {
            let working_dir = result.unwrap();
            assert_eq!(
                fs::read_to_string(working_dir.join("terraform.tfvars")).unwrap(),
                format!("index = {}", i)
            );
        }
    }
}
