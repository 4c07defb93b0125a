//! Typed view of the effective configuration.
//!
//! The merge engine works on untyped trees; this schema is applied once after
//! all layers are merged. Every field has a default so that partial trees
//! (for example a test that only sets `preCommit`) still deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectiveConfig {
    pub general: GeneralConfig,
    pub pre_commit: PreCommitConfig,
    pub pre_push: PrePushConfig,
    pub commit_msg: CommitMsgConfig,
    pub meta: MetaConfig,
    pub advanced: AdvancedConfig,
}

/// Runtime toggles, mostly fed by environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralConfig {
    pub verbose: bool,
    pub auto_fix: bool,
    /// Accepted and reported; checks always run sequentially
    pub parallel: bool,
    pub debug: bool,
    pub color: bool,
    pub ci: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            auto_fix: false,
            parallel: false,
            debug: false,
            color: true,
            ci: false,
        }
    }
}

/// One named check in a hook's run list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDescriptor {
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub critical: bool,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl CheckDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            critical: true,
            options: Map::new(),
        }
    }

    pub fn non_critical(mut self) -> Self {
        self.critical = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.options
            .insert("command".to_string(), Value::String(command.into()));
        self
    }

    /// `options.command`, if configured
    pub fn command(&self) -> Option<&str> {
        self.options.get("command").and_then(Value::as_str)
    }

    /// `options.fixCommand`, if configured
    pub fn fix_command(&self) -> Option<&str> {
        self.options.get("fixCommand").and_then(Value::as_str)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreCommitConfig {
    pub enabled: bool,
    pub checks: Vec<CheckDescriptor>,
    /// Milliseconds for the whole run; 0 disables the limit
    pub timeout: u64,
    /// Skip the hook when the last commit message matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_pattern: Option<String>,
}

impl Default for PreCommitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            checks: Vec::new(),
            timeout: 60_000,
            skip_pattern: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrePushConfig {
    pub enabled: bool,
    pub checks: Vec<CheckDescriptor>,
    /// Milliseconds for the whole run; 0 disables the limit
    pub timeout: u64,
    /// Glob patterns of branches that bypass the hook
    pub skip_branches: Vec<String>,
}

impl Default for PrePushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            checks: Vec::new(),
            timeout: 300_000,
            skip_branches: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitMsgConfig {
    pub enabled: bool,
    pub skip_in_ci: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub min_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    pub types: Vec<String>,
    pub scopes: Vec<String>,
    pub require_scope: bool,
    pub allow_merge: bool,
    pub allow_revert: bool,
    pub allow_squash: bool,
    pub allow_emoji: bool,
    pub auto_skip_patterns: Vec<String>,
    pub examples: Vec<String>,
}

impl Default for CommitMsgConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_in_ci: false,
            pattern: None,
            min_length: 0,
            max_length: None,
            types: Vec::new(),
            scopes: Vec::new(),
            require_scope: false,
            allow_merge: true,
            allow_revert: true,
            allow_squash: true,
            allow_emoji: true,
            auto_skip_patterns: Vec::new(),
            examples: Vec::new(),
        }
    }
}

/// Derived facts about the resolution itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaConfig {
    pub project_type: String,
    pub environment: String,
    pub generated_at: DateTime<Utc>,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            project_type: "common".to_string(),
            environment: "development".to_string(),
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedConfig {
    pub cache: CacheConfig,
    /// The environment variables that influenced resolution
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub directory: String,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: ".hookforge/cache".to_string(),
            ttl_seconds: 3600,
        }
    }
}
