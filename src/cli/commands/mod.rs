//! Command implementations for the hookforge CLI
//!
//! Each command lives in its own module. [`Session`] carries what every
//! command needs: the repository root, the configuration resolver and the
//! output handler.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Output;
use crate::config::environment::EnvToggles;
use crate::config::{ConfigResolver, EffectiveConfig, EnvSnapshot, ProjectType};
use crate::git::GitOperations;

pub mod config;
pub mod hooks;
pub mod install;
pub mod uninstall;

#[derive(Parser)]
#[command(
    name = "hookforge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Layered-config git hooks with commit message validation",
    long_about = "hookforge runs configurable pre-commit and pre-push checks and validates \
                  commit messages. Configuration is merged from built-in presets, the \
                  detected project type, user and repository files."
)]
pub struct Cli {
    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory", global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print full error chains
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use custom configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip detection and use this project type
    #[arg(long, global = true, value_name = "TYPE")]
    pub project_type: Option<ProjectType>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the commit message in FILE (commit-msg hook)
    CommitMsg(hooks::CommitMsgArgs),
    /// Run the pre-commit checks
    PreCommit,
    /// Run the pre-push checks
    PrePush(hooks::PrePushArgs),
    /// Install git hooks into the current repository
    Install(install::InstallArgs),
    /// Remove hooks written by install
    Uninstall,
    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

impl Cli {
    /// Debug output requested by flag or environment
    pub fn debug_enabled(&self) -> bool {
        self.debug || EnvToggles::load().debug.unwrap_or(false)
    }

    /// Run the command; `Ok(false)` means the hook or check failed
    pub async fn run(self) -> Result<bool> {
        setup_logging(self.verbose, self.quiet);

        let root = match &self.directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to read current directory")?,
        };
        let root = std::fs::canonicalize(&root)
            .with_context(|| format!("Directory {} does not exist", root.display()))?;
        // Hooks run from the top of the working tree
        let root = GitOperations::discover_from(&root)
            .ok()
            .and_then(|git| git.workdir().map(Path::to_path_buf))
            .unwrap_or(root);

        let resolver = ConfigResolver::new(&root, EnvSnapshot::capture())
            .with_custom_config(self.config.clone());
        let session = Session {
            root,
            resolver,
            project_type: self.project_type,
            overrides: self.overrides(),
            verbose: self.verbose > 0,
            quiet: self.quiet,
        };

        match self.command {
            Commands::CommitMsg(args) => hooks::commit_msg(&session, args).await,
            Commands::PreCommit => hooks::pre_commit(&session).await,
            Commands::PrePush(args) => hooks::pre_push(&session, args).await,
            Commands::Install(args) => install::execute(&session, args).await,
            Commands::Uninstall => uninstall::execute(&session).await,
            Commands::Config(cmd) => config::execute(&session, cmd).await,
        }
    }

    /// CLI flags as the highest-priority configuration layer
    fn overrides(&self) -> Value {
        let mut general = Map::new();
        if self.verbose > 0 {
            general.insert("verbose".to_string(), Value::Bool(true));
        }
        if self.debug {
            general.insert("debug".to_string(), Value::Bool(true));
        }
        json!({ "general": general })
    }
}

/// Per-invocation state shared by the commands
pub struct Session {
    pub root: PathBuf,
    pub resolver: ConfigResolver,
    pub project_type: Option<ProjectType>,
    pub overrides: Value,
    pub verbose: bool,
    pub quiet: bool,
}

impl Session {
    pub fn config(&self) -> Result<Arc<EffectiveConfig>> {
        self.resolver
            .resolve(self.project_type, Some(&self.overrides))
    }

    /// Output handler honouring both the flags and the resolved config
    pub fn output(&self, config: &EffectiveConfig) -> Output {
        if !config.general.color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        Output::new(self.verbose || config.general.verbose, self.quiet)
    }

    /// Repository containing the root, if there is one
    pub fn git(&self) -> Option<GitOperations> {
        GitOperations::discover_from(&self.root)
            .map_err(|e| tracing::debug!("{e:#}"))
            .ok()
    }

    /// Repository containing the root, or an error naming it
    pub fn require_git(&self) -> Result<GitOperations> {
        GitOperations::discover_from(&self.root)
            .with_context(|| format!("{} is not inside a git repository", self.root.display()))
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
