//! `hookforge uninstall`

use anyhow::Result;
use std::fs;

use super::Session;
use super::install::InstallSnapshot;
use crate::hooks::HookKind;

pub async fn execute(session: &Session) -> Result<bool> {
    let config = session.config()?;
    let output = session.output(&config);
    let git = session.require_git()?;

    output.header("Removing git hooks");

    let mut removed = 0;
    for kind in HookKind::ALL {
        let name = kind.git_name();
        if git.remove_hook(name)? {
            output.success(&format!("Removed {name}"));
            removed += 1;
        } else if git.hook_exists(name) {
            output.info(&format!("Left {name} in place (not written by hookforge)"));
        }
    }

    let snapshot = InstallSnapshot::path(git.git_dir());
    if snapshot.exists() {
        if let Err(e) = fs::remove_file(&snapshot) {
            tracing::warn!("Could not remove {}: {e}", snapshot.display());
        }
    }

    if removed == 0 {
        output.info("No hookforge hooks were installed");
    }
    Ok(true)
}
