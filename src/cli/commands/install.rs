//! `hookforge install`: hook shims plus the diagnostic snapshot

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::Session;
use crate::config::EffectiveConfig;
use crate::git::{GitOperations, HOOK_MARKER};
use crate::hooks::HookKind;

#[derive(Args)]
pub struct InstallArgs {
    /// Overwrite hooks not written by hookforge
    #[arg(long)]
    pub force: bool,
}

/// Written to `<git-dir>/hookforge/install.json`; never read back by hooks
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallSnapshot {
    pub version: String,
    pub project_type: String,
    /// `custom` when a repository config file exists, else `default`
    pub config_type: String,
    pub installed: DateTime<Utc>,
    pub hooks: HookFlags,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookFlags {
    pub pre_commit: bool,
    pub pre_push: bool,
    pub commit_msg: bool,
}

impl InstallSnapshot {
    pub fn new(config: &EffectiveConfig, custom_config: bool) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            project_type: config.meta.project_type.clone(),
            config_type: if custom_config { "custom" } else { "default" }.to_string(),
            installed: Utc::now(),
            hooks: HookFlags {
                pre_commit: config.pre_commit.enabled,
                pre_push: config.pre_push.enabled,
                commit_msg: config.commit_msg.enabled,
            },
        }
    }

    pub fn path(git_dir: &Path) -> PathBuf {
        git_dir.join("hookforge").join("install.json")
    }

    pub fn write(&self, git_dir: &Path) -> Result<PathBuf> {
        let path = Self::path(git_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

pub async fn execute(session: &Session, args: InstallArgs) -> Result<bool> {
    let config = session.config()?;
    let output = session.output(&config);
    let git = session.require_git()?;

    output.header("Installing git hooks");

    let program = hookforge_program();
    let mut skipped = 0;
    for kind in HookKind::ALL {
        let name = kind.git_name();
        if git.hook_exists(name) && !git.is_managed_hook(name) && !args.force {
            output.warning(&format!(
                "{name} already exists and was not written by hookforge (use --force)"
            ));
            skipped += 1;
            continue;
        }

        let path = git.install_hook(name, &shim(&program, *kind))?;
        output.success(&format!("Installed {name}"));
        output.debug(&path.display().to_string());
    }

    let snapshot = InstallSnapshot::new(&config, session.resolver.repository_config().is_some());
    write_snapshot(&git, &snapshot, &output);

    output.key_value("Project type", &snapshot.project_type, true);
    output.key_value("Config", &snapshot.config_type, false);

    Ok(skipped == 0)
}

/// Snapshot failures are reported but never fail the install
fn write_snapshot(git: &GitOperations, snapshot: &InstallSnapshot, output: &crate::cli::Output) {
    match snapshot.write(git.git_dir()) {
        Ok(path) => output.debug(&format!("Wrote {}", path.display())),
        Err(e) => tracing::warn!("Could not write install snapshot: {e:#}"),
    }
}

/// Program the shims call: `hookforge` on PATH, else this executable
fn hookforge_program() -> String {
    if which::which("hookforge").is_ok() {
        return "hookforge".to_string();
    }
    std::env::current_exe()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| "hookforge".to_string())
}

fn shim(program: &str, kind: HookKind) -> String {
    format!(
        "#!/bin/sh\n{HOOK_MARKER}\nexec \"{program}\" {} \"$@\"\n",
        kind.git_name()
    )
}
