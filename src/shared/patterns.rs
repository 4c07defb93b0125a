//! Pattern compilation utilities
//!
//! Configuration carries regular expressions as plain strings, optionally in
//! `/body/flags` form. This module turns them into case-insensitive
//! [`Regex`] matchers and supplies the Conventional Commits default.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Default structural pattern for commit messages.
///
/// Group 1 is the type, group 2 the parenthesized scope.
pub const DEFAULT_COMMIT_PATTERN: &str =
    r"^(feat|fix|docs|style|refactor|test|chore|perf|build|ci|revert)(\([^)]+\))?!?: .+";

lazy_static! {
    static ref DEFAULT_COMMIT_REGEX: Regex = RegexBuilder::new(DEFAULT_COMMIT_PATTERN)
        .case_insensitive(true)
        .build()
        .expect("default commit pattern is valid");
}

/// A pattern as it arrives from configuration or from code.
#[derive(Debug, Clone)]
pub enum PatternSource {
    /// Already compiled, used as-is
    Compiled(Regex),
    /// Textual form, bare or `/body/flags`
    Text(String),
}

impl From<Regex> for PatternSource {
    fn from(regex: Regex) -> Self {
        PatternSource::Compiled(regex)
    }
}

impl From<&str> for PatternSource {
    fn from(text: &str) -> Self {
        PatternSource::Text(text.to_string())
    }
}

impl From<String> for PatternSource {
    fn from(text: String) -> Self {
        PatternSource::Text(text)
    }
}

/// Compile a pattern, falling back to the Conventional Commits default
pub fn compile_pattern(source: Option<&PatternSource>) -> Result<Regex, regex::Error> {
    match source {
        None => Ok(DEFAULT_COMMIT_REGEX.clone()),
        Some(PatternSource::Compiled(regex)) => Ok(regex.clone()),
        Some(PatternSource::Text(text)) => compile_text(text),
    }
}

/// Convenience wrapper for optional configuration strings
pub fn compile_optional(text: Option<&str>) -> Result<Regex, regex::Error> {
    let source = text.map(PatternSource::from);
    compile_pattern(source.as_ref())
}

fn compile_text(text: &str) -> Result<Regex, regex::Error> {
    if let Some((body, flags)) = split_delimited(text) {
        let mut builder = RegexBuilder::new(body);
        if flags.is_empty() {
            builder.case_insensitive(true);
        }
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                // g, u, y have no meaning for a single match
                _ => {}
            }
        }
        return builder.build();
    }

    RegexBuilder::new(text).case_insensitive(true).build()
}

/// Split `/body/flags` into its parts; `None` for bare patterns
fn split_delimited(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    if flags.chars().all(|c| "gimsuxy".contains(c)) {
        Some((body, flags))
    } else {
        None
    }
}
