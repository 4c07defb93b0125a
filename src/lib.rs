//! # hookforge
//!
//! Git hooks driven by layered configuration.
//!
//! - **Layered config**: built-in base, environment and project-type presets,
//!   then user, repository and CLI overrides, deep-merged with name-keyed
//!   check lists.
//! - **Check runner**: ordered pre-commit and pre-push checks with critical
//!   and non-critical failures, skip rules and a whole-run timeout.
//! - **Commit messages**: Conventional Commits validation with type and scope
//!   allow-lists.
//!
//! ```bash
//! hookforge install
//! hookforge config show --format yaml
//! ```

pub mod cli;
pub mod config;
pub mod git;
pub mod hooks;
pub mod shared;

pub use cli::{Cli, Output};
pub use config::{ConfigResolver, EffectiveConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
