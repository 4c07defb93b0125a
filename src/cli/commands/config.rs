//! Configuration command implementations
//!
//! `config show` prints the effective configuration; `config validate`
//! checks the repository config files and the merged result.

use anyhow::{Result, bail};
use clap::{Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;

use super::Session;
use crate::cli::Output;
use crate::config::resolver::post_process;
use crate::config::smart_load::load_file;
use crate::config::{CheckDescriptor, EffectiveConfig};
use crate::hooks::{CheckRegistry, HookSpec};
use crate::shared::patterns::compile_optional;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        #[arg(long, value_enum, default_value_t = ShowFormat::Text)]
        format: ShowFormat,
    },
    /// Validate configuration files and the merged result
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Text,
    Json,
    Yaml,
    Toml,
}

impl ShowFormat {
    fn extension(&self) -> &'static str {
        match self {
            ShowFormat::Text => "txt",
            ShowFormat::Json => "json",
            ShowFormat::Yaml => "yaml",
            ShowFormat::Toml => "toml",
        }
    }
}

pub async fn execute(session: &Session, cmd: ConfigCommands) -> Result<bool> {
    match cmd {
        ConfigCommands::Show { format } => show(session, format),
        ConfigCommands::Validate => validate(session),
    }
}

fn show(session: &Session, format: ShowFormat) -> Result<bool> {
    let config = session.config()?;
    let output = session.output(&config);

    let rendered = match format {
        ShowFormat::Text => {
            show_summary(session, &config, &output);
            return Ok(true);
        }
        ShowFormat::Json => serde_json::to_string_pretty(config.as_ref())?,
        ShowFormat::Yaml => serde_yml::to_string(config.as_ref())?,
        ShowFormat::Toml => toml::to_string_pretty(config.as_ref())?,
    };

    let highlighted = if atty::is(atty::Stream::Stdout) && config.general.color {
        highlight(&rendered, format.extension())
    } else {
        None
    };
    print!("{}", highlighted.unwrap_or(rendered));
    Ok(true)
}

fn show_summary(session: &Session, config: &EffectiveConfig, output: &Output) {
    output.header("Effective configuration");
    output.key_value("Project type", &config.meta.project_type, true);
    output.key_value("Environment", &config.meta.environment, true);
    let source = session
        .resolver
        .repository_config()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());
    output.key_value("Config file", &source, false);

    section(
        output,
        "pre-commit",
        config.pre_commit.enabled,
        config.pre_commit.timeout,
        &config.pre_commit.checks,
    );
    section(
        output,
        "pre-push",
        config.pre_push.enabled,
        config.pre_push.timeout,
        &config.pre_push.checks,
    );
    if !config.pre_push.skip_branches.is_empty() {
        output.key_value("Skip branches", &config.pre_push.skip_branches.join(", "), false);
    }

    let commit_msg = &config.commit_msg;
    output.header(&format!("commit-msg ({})", enabled_label(commit_msg.enabled)));
    if !commit_msg.types.is_empty() {
        output.key_value("Types", &commit_msg.types.join(", "), false);
    }
    if !commit_msg.scopes.is_empty() {
        output.key_value("Scopes", &commit_msg.scopes.join(", "), false);
    }
    if let Some(max) = commit_msg.max_length {
        output.key_value("Max length", &max.to_string(), false);
    }
}

fn section(output: &Output, name: &str, enabled: bool, timeout: u64, checks: &[CheckDescriptor]) {
    let limit = if timeout == 0 {
        "no timeout".to_string()
    } else {
        format!("timeout {timeout}ms")
    };
    output.header(&format!("{name} ({}, {limit})", enabled_label(enabled)));
    for check in checks {
        let mut line = check.name.clone();
        if !check.enabled {
            line.push_str(" (disabled)");
        } else if !check.critical {
            line.push_str(" (non-critical)");
        }
        if let Some(command) = check.command() {
            line.push_str(&format!(": {command}"));
        }
        output.list_item(&line);
    }
}

fn enabled_label(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

fn validate(session: &Session) -> Result<bool> {
    let config = session.config()?;
    let output = session.output(&config);
    output.header("Validating configuration");

    let mut valid = true;
    let files: Vec<PathBuf> = session
        .resolver
        .repository_config()
        .into_iter()
        .chain(session.resolver.custom_config().map(PathBuf::from))
        .collect();

    if files.is_empty() {
        output.info("No repository config file; built-in defaults apply");
    }
    for path in files {
        match check_file(&path) {
            Ok(()) => output.success(&format!("{} is valid", path.display())),
            Err(e) => {
                output.error(&format!("{} is invalid", path.display()));
                output.detail(&format!("{e:#}"));
                valid = false;
            }
        }
    }

    let problems = effective_problems(&config, &CheckRegistry::with_builtins());
    for problem in &problems {
        output.error(problem);
    }
    valid &= problems.is_empty();

    if valid {
        output.success("Configuration is valid");
    }
    Ok(valid)
}

/// A single file must parse and fit the schema on its own
fn check_file(path: &std::path::Path) -> Result<()> {
    let Value::Object(mut tree) = load_file(path)? else {
        bail!("configuration root must be a mapping");
    };
    post_process(&mut tree);
    serde_json::from_value::<EffectiveConfig>(Value::Object(tree))?;
    Ok(())
}

/// Problems a hook run would hit with this configuration
fn effective_problems(config: &EffectiveConfig, registry: &CheckRegistry) -> Vec<String> {
    let mut problems = Vec::new();

    for spec in [HookSpec::pre_commit(config), HookSpec::pre_push(config)] {
        match spec {
            Ok(spec) => {
                for check in spec.checks.iter().filter(|c| c.enabled) {
                    if registry.resolve(check).is_none() {
                        problems.push(format!(
                            "{}: unknown check '{}' has no options.command",
                            spec.kind, check.name
                        ));
                    }
                }
            }
            Err(e) => problems.push(e.to_string()),
        }
    }

    if let Err(e) = compile_optional(config.commit_msg.pattern.as_deref()) {
        problems.push(format!("commit-msg: invalid pattern: {e}"));
    }
    for pattern in &config.commit_msg.auto_skip_patterns {
        if let Err(e) = compile_optional(Some(pattern)) {
            problems.push(format!("commit-msg: invalid auto-skip pattern '{pattern}': {e}"));
        }
    }

    problems
}

/// Highlight content using syntect
fn highlight(content: &str, extension: &str) -> Option<String> {
    let syntax_set = SyntaxSet::load_defaults_newlines();
    let theme_set = ThemeSet::load_defaults();

    let syntax = syntax_set.find_syntax_by_extension(extension)?;
    let theme = theme_set.themes.get("base16-eighties.dark")?;

    let mut highlighted = String::new();
    let mut highlighter = HighlightLines::new(syntax, theme);
    for line in content.lines() {
        let ranges = highlighter.highlight_line(line, &syntax_set).ok()?;
        highlighted.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
        highlighted.push('\n');
    }
    highlighted.push_str("\x1b[0m");

    Some(highlighted)
}
