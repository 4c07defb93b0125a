//! Configuration management for hookforge
//!
//! This module resolves the single effective configuration consumed by the
//! hook runners. Configuration is layered: an embedded base, an environment
//! overlay, a project-type overlay and user overrides are deep-merged by
//! [`merge`], then validated against the typed [`schema`].
//!
//! ## Example repository config (`hookforge.toml`)
//!
//! ```toml
//! [preCommit]
//! timeout = 120000
//!
//! [[preCommit.checks]]
//! name = "lint-staged"
//! enabled = false
//!
//! [[preCommit.checks]]
//! name = "unit-tests"
//! critical = false
//! options = { command = "npm run test:unit" }
//!
//! [prePush]
//! skipBranches = ["release/*", "hotfix/*"]
//!
//! [commitMsg]
//! requireScope = true
//! scopes = ["api", "ui", "deps"]
//! ```

pub mod defaults;
pub mod environment;
pub mod merge;
pub mod project;
pub mod resolver;
pub mod schema;
pub mod smart_load;

pub use environment::{EnvSnapshot, Environment};
pub use project::{ProjectType, detect_project_type};
pub use resolver::ConfigResolver;
pub use schema::{
    CheckDescriptor, CommitMsgConfig, EffectiveConfig, GeneralConfig, PreCommitConfig,
    PrePushConfig,
};
