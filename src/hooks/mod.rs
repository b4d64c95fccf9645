//! Lifecycle hooks
//!
//! Hooks are declared in configuration and attached to commands by name.
//! [`run_action_with_hooks`] runs the matching `before` hooks, the action,
//! then the matching `after` hooks.

use crate::config::{Config, Hook};
use crate::error::{ModcacheError, ModcacheResult};
use crate::options::RunOptions;
use std::future::Future;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Run `action` surrounded by the hooks configured for `opts.command`.
///
/// - A failing `before` hook aborts; the action does not run.
/// - After a successful action every matching `after` hook runs; after a
///   failed one only hooks with `run_on_error` do.
/// - The action's error takes precedence over `after` hook errors.
pub async fn run_action_with_hooks<F, Fut>(
    description: &str,
    opts: &RunOptions,
    config: &Config,
    action: F,
) -> ModcacheResult<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ModcacheResult<()>>,
{
    for hook in matching(&config.hooks.before, &opts.command) {
        execute_hook(hook, opts).await?;
    }

    debug!("Running action: {}", description);
    let result = action().await;

    let mut after_error = None;
    for hook in matching(&config.hooks.after, &opts.command) {
        if result.is_err() && !hook.run_on_error {
            debug!("Skipping after hook '{}' because {} failed", hook.name, description);
            continue;
        }
        if let Err(e) = execute_hook(hook, opts).await {
            warn!("{}", e);
            after_error.get_or_insert(e);
        }
    }

    result?;
    match after_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn matching<'a>(hooks: &'a [Hook], command: &'a str) -> impl Iterator<Item = &'a Hook> + 'a {
    hooks.iter().filter(move |h| h.matches(command))
}

async fn execute_hook(hook: &Hook, opts: &RunOptions) -> ModcacheResult<()> {
    let (program, args) = hook.execute.split_first().ok_or_else(|| ModcacheError::Hook {
        name: hook.name.clone(),
        reason: "no command to execute".to_string(),
    })?;

    info!("Executing hook: {}", hook.name);
    debug!("Hook command: {:?} in {}", hook.execute, opts.working_dir.display());

    let output = Command::new(program)
        .args(args)
        .current_dir(&opts.working_dir)
        .env("MODCACHE_COMMAND", &opts.command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ModcacheError::Hook {
            name: hook.name.clone(),
            reason: format!("failed to run {}: {}", program, e),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        info!("[{}] {}", hook.name, stdout.trim());
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ModcacheError::Hook {
            name: hook.name.clone(),
            reason: match output.status.code() {
                Some(code) => format!("exit code {}: {}", code, stderr.trim()),
                None => format!("terminated by signal: {}", stderr.trim()),
            },
        });
    }

    Ok(())
}
