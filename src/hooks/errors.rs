//! Error taxonomy for hook runs.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use super::HookKind;

/// Failures that end a pre-commit / pre-push run before checks decide it
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Unknown check '{name}' in {hook}; known checks: {known}")]
    UnknownCheck {
        hook: HookKind,
        name: String,
        known: String,
    },

    #[error("{hook} timed out after {}ms", .after.as_millis())]
    Timeout { hook: HookKind, after: Duration },

    #[error("Invalid skip pattern for {hook}: {source}")]
    Pattern {
        hook: HookKind,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid skip branches for {hook}: {message}")]
    Branches { hook: HookKind, message: String },
}

/// Commit message rejections, each with its own user-facing message
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Commit message is empty")]
    EmptyMessage,

    #[error("Commit message is too short ({length} characters, minimum {min})")]
    TooShort { length: usize, min: usize },

    #[error("Commit message is too long ({length} characters, maximum {max})")]
    TooLong { length: usize, max: usize },

    #[error("Commit message does not match the expected format: {subject}")]
    MalformedFormat { subject: String },

    #[error("Commit type '{found}' is not allowed (allowed: {})", .allowed.join(", "))]
    DisallowedType { found: String, allowed: Vec<String> },

    #[error("Commit scope is required, e.g. {kind}(scope): description")]
    MissingScope { kind: String },

    #[error("{}", scope_message(.found, .allowed))]
    DisallowedScope {
        found: Option<String>,
        allowed: Vec<String>,
    },

    #[error("Emoji are not allowed in commit messages")]
    EmojiNotAllowed,

    #[error("Invalid commit pattern: {0}")]
    Pattern(#[from] regex::Error),
}

fn scope_message(found: &Option<String>, allowed: &[String]) -> String {
    match found {
        Some(scope) => format!(
            "Commit scope '{scope}' is not allowed (allowed: {})",
            allowed.join(", ")
        ),
        None => format!("Commit scope is required (allowed: {})", allowed.join(", ")),
    }
}

/// Stable tag for environmental failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::PermissionDenied => "permission-denied",
            ErrorKind::Io => "io",
        }
    }
}

impl From<io::ErrorKind> for ErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::Io,
        }
    }
}

/// Input files that could not be read
#[derive(Debug, Error)]
#[error("[{}] cannot read {}: {source}", .kind.as_str(), .path.display())]
pub struct EnvironmentalError {
    pub kind: ErrorKind,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl EnvironmentalError {
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            kind: source.kind().into(),
            path: path.into(),
            source,
        }
    }
}
