//! Pre-push hook entry point
//!
//! git invokes the hook as `pre-push <remote> <url>`; the arguments are
//! available to check commands as `$1` and `$2`.

use anyhow::Result;
use std::path::Path;

use super::checks::CheckRegistry;
use super::runner::{HookRunner, HookSpec};
use super::HookContext;
use crate::cli::Output;
use crate::config::EffectiveConfig;

/// Run the pre-push checks; `Ok(false)` when a critical check failed
pub async fn execute(
    config: &EffectiveConfig,
    registry: &CheckRegistry,
    root: &Path,
    context: &HookContext,
    args: Vec<String>,
    output: &Output,
) -> Result<bool> {
    let spec = HookSpec::pre_push(config)?;
    if let Some(remote) = args.first() {
        tracing::debug!("Pushing to {remote}");
    }

    let runner = HookRunner::new(registry, output, root).with_args(args);
    let report = runner.run(&spec, context).await?;

    Ok(report.passed())
}
