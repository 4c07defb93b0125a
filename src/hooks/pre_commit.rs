//! Pre-commit hook entry point

use anyhow::Result;
use std::path::Path;

use super::checks::CheckRegistry;
use super::runner::{HookRunner, HookSpec};
use super::HookContext;
use crate::cli::Output;
use crate::config::EffectiveConfig;

/// Run the pre-commit checks; `Ok(false)` when a critical check failed
pub async fn execute(
    config: &EffectiveConfig,
    registry: &CheckRegistry,
    root: &Path,
    context: &HookContext,
    output: &Output,
) -> Result<bool> {
    let spec = HookSpec::pre_commit(config)?;
    let runner = HookRunner::new(registry, output, root);
    let report = runner.run(&spec, context).await?;

    Ok(report.passed())
}
