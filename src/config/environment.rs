//! Runtime environment detection
//!
//! Environment variables are read once into an [`EnvSnapshot`] so that the
//! resolver (and its tests) never touch the process environment directly.
//! `HOOKFORGE_*` toggles go through figment's `Env` provider.

use figment::Figment;
use figment::providers::Env;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;

/// Variables that signal a CI run
pub const CI_INDICATORS: &[&str] = &[
    "CI",
    "CONTINUOUS_INTEGRATION",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "TRAVIS",
    "CIRCLECI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

pub const ENV_NAME: &str = "HOOKFORGE_ENV";
pub const ENV_NAME_FALLBACK: &str = "NODE_ENV";
pub const ENV_VERBOSE: &str = "HOOKFORGE_VERBOSE";
pub const ENV_AUTO_FIX: &str = "HOOKFORGE_AUTO_FIX";
pub const ENV_PARALLEL: &str = "HOOKFORGE_PARALLEL";
pub const ENV_CACHE: &str = "HOOKFORGE_CACHE";
pub const ENV_DEBUG: &str = "HOOKFORGE_DEBUG";

const TOGGLE_PREFIX: &str = "HOOKFORGE_";
const TOGGLE_KEYS: &[&str] = &["verbose", "auto_fix", "parallel", "debug", "cache"];

/// Target environment, selects the environment overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Ci,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Ci => "ci",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean `HOOKFORGE_*` toggles; unset variables stay `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvToggles {
    #[serde(deserialize_with = "flag")]
    pub verbose: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub auto_fix: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub parallel: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub debug: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub cache: Option<bool>,
}

impl EnvToggles {
    /// Read the toggles from the process environment
    pub fn load() -> Self {
        Figment::from(Env::prefixed(TOGGLE_PREFIX).only(TOGGLE_KEYS))
            .extract()
            .unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed {TOGGLE_PREFIX}* toggles: {e}");
                Self::default()
            })
    }
}

/// Env values arrive typed: `true` as a bool, `1` as a number, `yes` as text
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Num(i64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let enabled = match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Num(value) => value == 1,
        Flag::Text(value) => is_truthy(&value),
        Flag::Other(_) => false,
    };
    Ok(Some(enabled))
}

/// Point-in-time copy of the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
    toggles: EnvToggles,
}

impl EnvSnapshot {
    /// Capture the current process environment
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
            toggles: EnvToggles::load(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            toggles: EnvToggles::default(),
        }
    }

    pub fn with_toggles(mut self, toggles: EnvToggles) -> Self {
        self.toggles = toggles;
        self
    }

    pub fn toggles(&self) -> EnvToggles {
        self.toggles
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Whether any CI indicator is set to something other than a false value
    pub fn is_ci(&self) -> bool {
        CI_INDICATORS.iter().any(|key| match self.get(key) {
            Some(value) => !is_falsy(value),
            None => false,
        })
    }

    /// Detect the target environment
    pub fn environment(&self) -> Environment {
        if self.is_ci() {
            return Environment::Ci;
        }

        let name = self
            .get(ENV_NAME)
            .or_else(|| self.get(ENV_NAME_FALLBACK))
            .map(|value| value.trim().to_lowercase());

        match name.as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("test") | Some("testing") => Environment::Test,
            Some("ci") => Environment::Ci,
            _ => Environment::Development,
        }
    }

    /// Overlay built from explicit toggles; unset variables contribute nothing
    pub fn toggles_overlay(&self) -> Value {
        let mut general = Map::new();
        let toggles = [
            ("verbose", self.toggles.verbose),
            ("autoFix", self.toggles.auto_fix),
            ("parallel", self.toggles.parallel),
            ("debug", self.toggles.debug),
        ];
        for (key, value) in toggles {
            if let Some(value) = value {
                general.insert(key.to_string(), Value::Bool(value));
            }
        }
        if self.is_ci() {
            general.insert("ci".to_string(), Value::Bool(true));
        }

        let mut overlay = json!({ "general": general });
        if let Some(enabled) = self.toggles.cache {
            overlay["advanced"] = json!({ "cache": { "enabled": enabled } });
        }
        overlay
    }

    /// The subset of variables this tool reads, for `advanced.env`
    pub fn relevant(&self) -> BTreeMap<String, String> {
        let known = [
            ENV_NAME,
            ENV_NAME_FALLBACK,
            ENV_VERBOSE,
            ENV_AUTO_FIX,
            ENV_PARALLEL,
            ENV_CACHE,
            ENV_DEBUG,
        ];
        known
            .iter()
            .chain(CI_INDICATORS.iter())
            .filter_map(|key| self.get(key).map(|v| (key.to_string(), v.to_string())))
            .collect()
    }
}

/// Truthy flag: `1`, `true`, `yes`, `on`
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn is_falsy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_development() {
        assert_eq!(EnvSnapshot::default().environment(), Environment::Development);
    }

    #[test]
    fn test_ci_signal_wins() {
        let env =
            EnvSnapshot::from_pairs([("GITHUB_ACTIONS", "true"), ("HOOKFORGE_ENV", "production")]);
        assert_eq!(env.environment(), Environment::Ci);

        let env = EnvSnapshot::from_pairs([("CI", "false")]);
        assert!(!env.is_ci());
    }

    #[test]
    fn test_explicit_environment_names() {
        let env = EnvSnapshot::from_pairs([("HOOKFORGE_ENV", "Production")]);
        assert_eq!(env.environment(), Environment::Production);

        let env = EnvSnapshot::from_pairs([("NODE_ENV", "test")]);
        assert_eq!(env.environment(), Environment::Test);

        let env = EnvSnapshot::from_pairs([("HOOKFORGE_ENV", "staging")]);
        assert_eq!(env.environment(), Environment::Development);
    }

    #[test]
    fn test_toggles_overlay_only_sets_present_flags() {
        let toggles = EnvToggles {
            verbose: Some(true),
            cache: Some(false),
            ..EnvToggles::default()
        };
        let overlay = EnvSnapshot::default().with_toggles(toggles).toggles_overlay();

        assert_eq!(overlay["general"]["verbose"], true);
        assert!(overlay["general"].get("autoFix").is_none());
        assert_eq!(overlay["advanced"]["cache"]["enabled"], false);
    }

    #[test]
    fn test_toggles_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("HOOKFORGE_VERBOSE", "yes");
            jail.set_env("HOOKFORGE_AUTO_FIX", "1");
            jail.set_env("HOOKFORGE_PARALLEL", "true");
            jail.set_env("HOOKFORGE_CACHE", "0");
            jail.set_env("HOOKFORGE_DEBUG", "off");
            jail.set_env("HOOKFORGE_ENV", "production");

            let toggles = EnvToggles::load();
            assert_eq!(toggles.verbose, Some(true));
            assert_eq!(toggles.auto_fix, Some(true));
            assert_eq!(toggles.parallel, Some(true));
            assert_eq!(toggles.cache, Some(false));
            assert_eq!(toggles.debug, Some(false));

            let overlay = EnvSnapshot::capture().toggles_overlay();
            assert_eq!(overlay["general"]["autoFix"], true);
            assert_eq!(overlay["advanced"]["cache"]["enabled"], false);
            Ok(())
        });
    }

    #[test]
    fn test_unset_toggles_stay_unset() {
        figment::Jail::expect_with(|_| {
            assert_eq!(EnvToggles::load(), EnvToggles::default());
            Ok(())
        });
    }

    #[test]
    fn test_relevant_filters_unrelated_vars() {
        let env = EnvSnapshot::from_pairs([("HOME", "/root"), ("CI", "1")]);
        let relevant = env.relevant();
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant.get("CI").map(String::as_str), Some("1"));
    }
}
