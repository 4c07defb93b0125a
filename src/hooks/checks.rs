//! Check registry and the shell-command check.
//!
//! Every check a hook names is resolved here before anything runs. Names map
//! to registered [`Check`] implementations; a descriptor carrying
//! `options.command` becomes an ad-hoc [`CommandCheck`] even when the name
//! is unknown.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;

use crate::config::CheckDescriptor;

/// Lines of command output kept in a failure message
const OUTPUT_TAIL_LINES: usize = 20;

/// Everything a check sees while running
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub root: &'a Path,
    pub descriptor: &'a CheckDescriptor,
    /// Arguments git passed to the hook, substituted for `$1`, `$2`, ...
    pub args: &'a [String],
    pub auto_fix: bool,
    pub verbose: bool,
}

#[async_trait]
pub trait Check: Send + Sync {
    /// Short human description, shown while the check runs
    fn describe(&self, descriptor: &CheckDescriptor) -> String;

    async fn run(&self, ctx: &CheckContext<'_>) -> Result<()>;
}

/// Runs a shell command; a non-zero exit fails the check
#[derive(Debug, Clone)]
pub struct CommandCheck {
    command: String,
    fix_command: Option<String>,
}

impl CommandCheck {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            fix_command: None,
        }
    }

    pub fn with_fix(mut self, fix_command: impl Into<String>) -> Self {
        self.fix_command = Some(fix_command.into());
        self
    }

    /// Descriptor options win over the registered command
    fn command_for<'a>(&'a self, ctx: &CheckContext<'a>) -> &'a str {
        if ctx.auto_fix {
            if let Some(fix) = ctx
                .descriptor
                .fix_command()
                .or(self.fix_command.as_deref())
            {
                return fix;
            }
        }
        ctx.descriptor.command().unwrap_or(&self.command)
    }
}

#[async_trait]
impl Check for CommandCheck {
    fn describe(&self, descriptor: &CheckDescriptor) -> String {
        descriptor.command().unwrap_or(&self.command).to_string()
    }

    async fn run(&self, ctx: &CheckContext<'_>) -> Result<()> {
        let command = substitute_args(self.command_for(ctx), ctx.args);
        tracing::debug!("Running `{command}` in {}", ctx.root.display());

        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(ctx.root)
            .kill_on_drop(true)
            .output()
            .await?;

        if ctx.verbose {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if !stdout.trim().is_empty() {
                print!("{stdout}");
            }
        }

        if output.status.success() {
            return Ok(());
        }

        // 127 is the shell's "command not found"
        if output.status.code() == Some(127) {
            if let Some(program) = program_name(&command) {
                if which::which(program).is_err() {
                    bail!("`{program}` is not installed or not on PATH");
                }
            }
        }

        let code = output
            .status
            .code()
            .map_or_else(|| "a signal".to_string(), |c| c.to_string());
        let mut combined = String::from_utf8_lossy(&output.stderr).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stdout));
        let tail = tail_lines(&combined, OUTPUT_TAIL_LINES);

        if tail.is_empty() {
            bail!("`{command}` exited with {code}");
        }
        bail!("`{command}` exited with {code}\n{tail}");
    }
}

/// Named checks known to the runners
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: BTreeMap<String, Arc<dyn Check>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in checks; project presets retarget them
    /// through `options.command`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("lint-staged", CommandCheck::new("npx lint-staged"));
        registry.register(
            "lint",
            CommandCheck::new("npm run lint").with_fix("npm run lint -- --fix"),
        );
        registry.register(
            "format",
            CommandCheck::new("npx prettier --check .").with_fix("npx prettier --write ."),
        );
        registry.register("type-check", CommandCheck::new("npx tsc --noEmit"));
        registry.register("build", CommandCheck::new("npm run build"));
        registry.register("test", CommandCheck::new("npm test"));
        registry
    }

    /// Register or replace a check under `name`
    pub fn register(&mut self, name: impl Into<String>, check: impl Check + 'static) {
        self.checks.insert(name.into(), Arc::new(check));
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.checks.keys().map(String::as_str).collect()
    }

    /// Implementation for a descriptor, if it can run
    pub fn resolve(&self, descriptor: &CheckDescriptor) -> Option<Arc<dyn Check>> {
        if let Some(check) = self.checks.get(&descriptor.name) {
            return Some(Arc::clone(check));
        }
        descriptor
            .command()
            .map(|command| Arc::new(CommandCheck::new(command)) as Arc<dyn Check>)
    }
}

/// Replace `$1`, `$2`, ... with hook arguments, highest index first
fn substitute_args(command: &str, args: &[String]) -> String {
    let mut result = command.to_string();
    for (i, arg) in args.iter().enumerate().rev() {
        result = result.replace(&format!("${}", i + 1), arg);
    }
    result
}

/// First word of a command that is not an environment assignment
fn program_name(command: &str) -> Option<&str> {
    command.split_whitespace().find(|word| !word.contains('='))
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
