//! Git hooks module
//!
//! Three hooks are supported:
//!
//! - `pre-commit` and `pre-push` run an ordered list of named checks through
//!   the generic [`HookRunner`]. Critical failures stop the run, non-critical
//!   ones are reported and the run continues. The whole run is bounded by the
//!   section's `timeout`.
//! - `commit-msg` validates the message with [`CommitMsgValidator`].
//!
//! ```toml
//! [prePush]
//! timeout = 300000
//! skipBranches = ["release/*"]
//!
//! [[prePush.checks]]
//! name = "build"
//! critical = true
//! options = { command = "cargo build" }
//! ```

use std::fmt;

use crate::git::GitOperations;

pub mod checks;
pub mod commit_msg;
pub mod errors;
pub mod pre_commit;
pub mod pre_push;
pub mod runner;

pub use checks::{Check, CheckContext, CheckRegistry, CommandCheck};
pub use commit_msg::{CommitMsgValidator, ParsedCommit, Verdict};
pub use errors::{EnvironmentalError, ErrorKind, HookError, ValidationError};
pub use runner::{CheckResult, HookReport, HookRunner, HookSpec, SkipReason, SkipRule};

/// The hooks hookforge installs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    PreCommit,
    PrePush,
    CommitMsg,
}

impl HookKind {
    pub const ALL: &'static [HookKind] =
        &[HookKind::PreCommit, HookKind::PrePush, HookKind::CommitMsg];

    /// Name git uses for the hook file
    pub fn git_name(&self) -> &'static str {
        match self {
            HookKind::PreCommit => "pre-commit",
            HookKind::PrePush => "pre-push",
            HookKind::CommitMsg => "commit-msg",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.git_name())
    }
}

/// Facts about the repository that skip predicates look at
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// Most recent commit message, for the pre-commit skip pattern
    pub commit_message: Option<String>,
    /// Current branch, for the pre-push skip list
    pub branch: Option<String>,
}

impl HookContext {
    /// Gather context from git; anything unavailable stays `None`
    pub fn from_git(git: Option<&GitOperations>) -> Self {
        let Some(git) = git else {
            return Self::default();
        };

        let branch = git
            .current_branch()
            .map_err(|e| tracing::debug!("No current branch: {e:#}"))
            .ok();
        let commit_message = git
            .last_commit_message()
            .map_err(|e| tracing::debug!("No last commit message: {e:#}"))
            .ok();

        Self {
            commit_message,
            branch,
        }
    }
}
