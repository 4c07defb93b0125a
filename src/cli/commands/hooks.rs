//! Hook entry points invoked by the installed git shims

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use super::Session;
use crate::hooks::{self, CheckRegistry, HookContext};

#[derive(Args)]
pub struct CommitMsgArgs {
    /// File holding the candidate message (usually .git/COMMIT_EDITMSG)
    pub file: PathBuf,
}

#[derive(Args)]
pub struct PrePushArgs {
    /// Remote name and URL as passed by git
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

pub async fn commit_msg(session: &Session, args: CommitMsgArgs) -> Result<bool> {
    let config = session.config()?;
    let output = session.output(&config);

    let path = message_path(&session.root, args.file);
    hooks::commit_msg::execute(&config.commit_msg, config.general.ci, &path, &output)
}

/// git passes a path relative to the top of the working tree
fn message_path(root: &Path, file: PathBuf) -> PathBuf {
    if file.is_absolute() {
        file
    } else {
        root.join(file)
    }
}

pub async fn pre_commit(session: &Session) -> Result<bool> {
    let config = session.config()?;
    let output = session.output(&config);
    let context = HookContext::from_git(session.git().as_ref());
    let registry = CheckRegistry::with_builtins();

    hooks::pre_commit::execute(&config, &registry, &session.root, &context, &output).await
}

pub async fn pre_push(session: &Session, args: PrePushArgs) -> Result<bool> {
    let config = session.config()?;
    let output = session.output(&config);
    let context = HookContext::from_git(session.git().as_ref());
    let registry = CheckRegistry::with_builtins();

    hooks::pre_push::execute(
        &config,
        &registry,
        &session.root,
        &context,
        args.args,
        &output,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_path_is_relative_to_root() {
        let root = Path::new("/repo");
        assert_eq!(
            message_path(root, PathBuf::from(".git/COMMIT_EDITMSG")),
            Path::new("/repo/.git/COMMIT_EDITMSG")
        );
        assert_eq!(message_path(root, PathBuf::from("/tmp/msg")), Path::new("/tmp/msg"));
    }
}
