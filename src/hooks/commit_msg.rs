//! Commit message validation
//!
//! A single linear pipeline over the cleaned message. Special commits
//! (merges, reverts, squashes, auto-skip patterns) pass without the
//! structural checks; everything else must match the configured pattern
//! and the type/scope allow-lists.

use anyhow::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

use super::errors::{EnvironmentalError, ValidationError};
use crate::cli::Output;
use crate::config::CommitMsgConfig;
use crate::shared::patterns::compile_optional;

/// Type, scope and description extracted from a valid message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub commit_type: String,
    pub scope: Option<String>,
    pub description: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommit {
    AutoSkip { pattern: String },
    Merge,
    Revert,
    Squash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Validation did not run (hook disabled, or skipped in CI)
    Skipped,
    /// Accepted without structural checks
    Special(SpecialCommit),
    Valid(ParsedCommit),
}

pub struct CommitMsgValidator<'a> {
    config: &'a CommitMsgConfig,
    ci: bool,
}

impl<'a> CommitMsgValidator<'a> {
    pub fn new(config: &'a CommitMsgConfig, ci: bool) -> Self {
        Self { config, ci }
    }

    pub fn validate(&self, raw: &str) -> Result<Verdict, ValidationError> {
        if !self.config.enabled || (self.ci && self.config.skip_in_ci) {
            return Ok(Verdict::Skipped);
        }

        let message = clean_message(raw);
        if message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }

        if let Some(special) = self.special_commit(&message)? {
            return Ok(Verdict::Special(special));
        }

        let length = message.chars().count();
        if length < self.config.min_length {
            return Err(ValidationError::TooShort {
                length,
                min: self.config.min_length,
            });
        }
        if let Some(max) = self.config.max_length {
            if length > max {
                return Err(ValidationError::TooLong { length, max });
            }
        }

        let pattern = compile_optional(self.config.pattern.as_deref())?;
        let parsed = parse(&pattern, &message).ok_or_else(|| ValidationError::MalformedFormat {
            subject: message.lines().next().unwrap_or_default().to_string(),
        })?;

        if !self.config.types.is_empty() && !self.config.types.contains(&parsed.commit_type) {
            return Err(ValidationError::DisallowedType {
                found: parsed.commit_type,
                allowed: self.config.types.clone(),
            });
        }

        if self.config.require_scope && parsed.scope.is_none() {
            return Err(ValidationError::MissingScope {
                kind: parsed.commit_type,
            });
        }

        if !self.config.scopes.is_empty() {
            let allowed = parsed
                .scope
                .as_ref()
                .is_some_and(|scope| self.config.scopes.contains(scope));
            if !allowed {
                return Err(ValidationError::DisallowedScope {
                    found: parsed.scope,
                    allowed: self.config.scopes.clone(),
                });
            }
        }

        if !self.config.allow_emoji && contains_emoji(&message) {
            return Err(ValidationError::EmojiNotAllowed);
        }

        Ok(Verdict::Valid(parsed))
    }

    /// Validate and report; `true` when the commit may proceed
    pub fn run(&self, raw: &str, output: &Output) -> bool {
        match self.validate(raw) {
            Ok(Verdict::Skipped) => {
                output.debug("Commit message validation skipped");
                true
            }
            Ok(Verdict::Special(special)) => {
                output.debug(&format!("Special commit accepted: {special:?}"));
                true
            }
            Ok(Verdict::Valid(parsed)) => {
                let scope = parsed
                    .scope
                    .as_deref()
                    .map(|s| format!("({s})"))
                    .unwrap_or_default();
                output.success(&format!("Commit message is valid: {}{scope}", parsed.commit_type));
                output.debug(&format!("Description: {}", parsed.description));
                true
            }
            Err(e) => {
                output.error(&e.to_string());
                if matches!(e, ValidationError::MalformedFormat { .. }) {
                    self.print_format_help(output);
                }
                false
            }
        }
    }

    fn print_format_help(&self, output: &Output) {
        let mut help = String::from("Expected format: type(scope): description");
        if !self.config.examples.is_empty() {
            help.push_str("\nExamples:");
            for example in &self.config.examples {
                help.push_str(&format!("\n  {example}"));
            }
        }
        if !self.config.types.is_empty() {
            help.push_str(&format!("\nAllowed types: {}", self.config.types.join(", ")));
        }
        if !self.config.scopes.is_empty() {
            help.push_str(&format!("\nAllowed scopes: {}", self.config.scopes.join(", ")));
        }
        output.detail(&help);
    }

    fn special_commit(&self, message: &str) -> Result<Option<SpecialCommit>, ValidationError> {
        for pattern in &self.config.auto_skip_patterns {
            let regex = compile_optional(Some(pattern))?;
            if regex.is_match(message) {
                return Ok(Some(SpecialCommit::AutoSkip {
                    pattern: pattern.clone(),
                }));
            }
        }

        let special = if self.config.allow_merge && message.starts_with("Merge ") {
            Some(SpecialCommit::Merge)
        } else if self.config.allow_revert && message.starts_with("Revert ") {
            Some(SpecialCommit::Revert)
        } else if self.config.allow_squash && message.contains("squash") {
            Some(SpecialCommit::Squash)
        } else {
            None
        };
        Ok(special)
    }
}

/// Read the message file git hands to the hook and validate it
pub fn execute(config: &CommitMsgConfig, ci: bool, path: &Path, output: &Output) -> Result<bool> {
    let raw = fs::read_to_string(path).map_err(|e| EnvironmentalError::new(path, e))?;
    Ok(CommitMsgValidator::new(config, ci).run(&raw, output))
}

/// Drop `#` comment lines and surrounding whitespace
pub fn clean_message(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn parse(pattern: &Regex, message: &str) -> Option<ParsedCommit> {
    let captures = pattern.captures(message)?;

    let commit_type = captures
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let scope = captures
        .get(2)
        .map(|m| m.as_str().trim_start_matches('(').trim_end_matches(')').to_string())
        .filter(|s| !s.is_empty());

    // Description starts after the first ':' following the type/scope prefix
    let prefix_end = captures
        .get(2)
        .or_else(|| captures.get(1))
        .map_or(0, |m| m.end());
    let description = message[prefix_end..]
        .split_once(':')
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default();

    Some(ParsedCommit {
        commit_type,
        scope,
        description,
        raw: message.to_string(),
    })
}

fn contains_emoji(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            c as u32,
            0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0xFE0F
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CommitMsgConfig {
        CommitMsgConfig {
            types: ["feat", "fix", "docs", "chore"].map(String::from).to_vec(),
            auto_skip_patterns: vec!["^wip: ".to_string()],
            ..CommitMsgConfig::default()
        }
    }

    fn validate(config: &CommitMsgConfig, message: &str) -> Result<Verdict, ValidationError> {
        CommitMsgValidator::new(config, false).validate(message)
    }

    #[test]
    fn test_valid_with_scope() {
        let verdict = validate(&config(), "feat(button): add variant").unwrap();
        let Verdict::Valid(parsed) = verdict else {
            panic!("expected valid, got {verdict:?}");
        };
        assert_eq!(parsed.commit_type, "feat");
        assert_eq!(parsed.scope.as_deref(), Some("button"));
        assert_eq!(parsed.description, "add variant");
    }

    #[test]
    fn test_wip_without_colon_is_malformed() {
        let mut config = config();
        config.auto_skip_patterns = vec!["^wip:".to_string()];
        assert!(matches!(
            validate(&config, "wip"),
            Err(ValidationError::MalformedFormat { .. })
        ));
    }

    #[test]
    fn test_merge_is_special() {
        let mut config = config();
        config.min_length = 100;
        assert_eq!(
            validate(&config, "Merge branch 'x'").unwrap(),
            Verdict::Special(SpecialCommit::Merge)
        );

        config.allow_merge = false;
        assert!(validate(&config, "Merge branch 'x'").is_err());
    }

    #[test]
    fn test_revert_squash_and_auto_skip() {
        let config = config();
        assert_eq!(
            validate(&config, "Revert \"feat: x\"").unwrap(),
            Verdict::Special(SpecialCommit::Revert)
        );
        assert_eq!(
            validate(&config, "please squash me").unwrap(),
            Verdict::Special(SpecialCommit::Squash)
        );
        assert!(matches!(
            validate(&config, "WIP: halfway").unwrap(),
            Verdict::Special(SpecialCommit::AutoSkip { .. })
        ));
    }

    #[test]
    fn test_empty_after_comments() {
        assert!(matches!(
            validate(&config(), ""),
            Err(ValidationError::EmptyMessage)
        ));
        assert!(matches!(
            validate(&config(), "# Please enter the commit message\n#\n  \n"),
            Err(ValidationError::EmptyMessage)
        ));
    }

    #[test]
    fn test_length_bounds() {
        let mut config = config();
        config.min_length = 10;
        assert!(matches!(
            validate(&config, "fix:a"),
            Err(ValidationError::TooShort { length: 5, min: 10 })
        ));

        config.min_length = 0;
        config.max_length = Some(12);
        assert!(matches!(
            validate(&config, "feat: a longer subject"),
            Err(ValidationError::TooLong { max: 12, .. })
        ));
    }

    #[test]
    fn test_length_counts_characters() {
        let mut config = config();
        config.max_length = Some(12);
        // 12 characters, more than 12 bytes
        assert!(validate(&config, "fix: ünïcödé").is_ok());
    }

    #[test]
    fn test_comment_lines_are_stripped_before_parsing() {
        let raw = "# leading comment\nfix(api): handle nulls\n\n# trailing\n";
        let Verdict::Valid(parsed) = validate(&config(), raw).unwrap() else {
            panic!("expected valid");
        };
        assert_eq!(parsed.raw, "fix(api): handle nulls");
    }

    #[test]
    fn test_type_must_be_allowed() {
        let mut config = config();
        config.pattern = Some(r"^(\w+)(\([^)]+\))?: .+".to_string());
        let err = validate(&config, "style: tabs").unwrap_err();
        assert!(
            matches!(err, ValidationError::DisallowedType { ref found, .. } if found == "style")
        );
    }

    #[test]
    fn test_scope_rules() {
        let mut config = config();
        config.require_scope = true;
        assert!(matches!(
            validate(&config, "feat: no scope"),
            Err(ValidationError::MissingScope { .. })
        ));

        config.require_scope = false;
        config.scopes = vec!["ui".to_string()];
        assert!(matches!(
            validate(&config, "feat: no scope"),
            Err(ValidationError::DisallowedScope { found: None, .. })
        ));
        assert!(matches!(
            validate(&config, "feat(db): wrong scope"),
            Err(ValidationError::DisallowedScope { found: Some(_), .. })
        ));
        assert!(validate(&config, "feat(ui): right scope").is_ok());
    }

    #[test]
    fn test_emoji() {
        let mut config = config();
        assert!(validate(&config, "feat: ship it 🚀").is_ok());

        config.allow_emoji = false;
        assert!(matches!(
            validate(&config, "feat: ship it 🚀"),
            Err(ValidationError::EmojiNotAllowed)
        ));
        assert!(matches!(
            validate(&config, "fix: sunny ☀"),
            Err(ValidationError::EmojiNotAllowed)
        ));
    }

    #[test]
    fn test_disabled_and_ci_skip() {
        let mut config = config();
        config.skip_in_ci = true;
        assert_eq!(
            CommitMsgValidator::new(&config, true).validate("garbage").unwrap(),
            Verdict::Skipped
        );
        assert!(CommitMsgValidator::new(&config, false).validate("garbage").is_err());

        config.enabled = false;
        assert_eq!(validate(&config, "").unwrap(), Verdict::Skipped);
    }

    #[test]
    fn test_auto_skip_accepts_delimited_pattern() {
        let mut config = config();
        config.auto_skip_patterns = vec!["/^wip/i".to_string()];
        assert_eq!(
            validate(&config, "WIP halfway there").unwrap(),
            Verdict::Special(SpecialCommit::AutoSkip {
                pattern: "/^wip/i".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_configured_pattern() {
        let mut config = config();
        config.pattern = Some("(unclosed".to_string());
        assert!(matches!(
            validate(&config, "feat: x"),
            Err(ValidationError::Pattern(_))
        ));
    }

    #[test]
    fn test_run_reports_boolean() {
        let output = Output::new(false, true);
        let config = config();
        let validator = CommitMsgValidator::new(&config, false);
        assert!(validator.run("docs: readme", &output));
        assert!(!validator.run("nonsense", &output));
    }

    #[test]
    fn test_execute_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = Output::new(false, true);
        let err = execute(&config(), false, &dir.path().join("MISSING"), &output).unwrap_err();
        let env_err = err.downcast_ref::<EnvironmentalError>().unwrap();
        assert_eq!(env_err.kind, crate::hooks::ErrorKind::NotFound);
    }
}
