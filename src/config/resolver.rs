//! Configuration resolution.
//!
//! [`ConfigResolver`] is built once per process and handed to whoever needs
//! the effective configuration. It merges, in increasing priority:
//!
//! 1. the embedded base configuration,
//! 2. the environment overlay (preset plus `HOOKFORGE_*` toggles),
//! 3. the project overlay (preset plus `.hookforge/projects/<type>.*`),
//! 4. user overrides (user config, repository config, `--config`, CLI).
//!
//! Optional sources that are missing contribute nothing; sources that fail
//! to load are logged and skipped. The first successful resolution is cached
//! and every later call returns the same `Arc`.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use super::defaults::{BASE_CONFIG, environment_preset, project_preset};
use super::environment::{EnvSnapshot, Environment};
use super::merge::{dedupe, merge, merge_layers};
use super::project::{ProjectType, detect_project_type};
use super::schema::EffectiveConfig;
use super::smart_load::{ConfigFormat, find_with_stem, load_file, load_str};

/// Hook sections and the `*Defaults` sections folded beneath them
const SECTIONS: &[(&str, &str)] = &[
    ("preCommit", "preCommitDefaults"),
    ("prePush", "prePushDefaults"),
    ("commitMsg", "commitMsgDefaults"),
];

/// Repository-level config file stems, checked in order
const REPO_CONFIG_STEMS: &[&str] = &["hookforge", ".hookforge"];

pub struct ConfigResolver {
    root: PathBuf,
    env: EnvSnapshot,
    user_config_dir: Option<PathBuf>,
    custom_config: Option<PathBuf>,
    cache: OnceLock<Arc<EffectiveConfig>>,
}

impl ConfigResolver {
    pub fn new(root: impl Into<PathBuf>, env: EnvSnapshot) -> Self {
        Self {
            root: root.into(),
            env,
            user_config_dir: dirs::config_dir().map(|dir| dir.join("hookforge")),
            custom_config: None,
            cache: OnceLock::new(),
        }
    }

    /// Explicit config file, merged above the repository config
    pub fn with_custom_config(mut self, path: Option<PathBuf>) -> Self {
        self.custom_config = path;
        self
    }

    /// Directory holding the user-level `config.*`; `None` disables it
    pub fn with_user_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_config_dir = dir;
        self
    }

    /// The `--config` file, if one was given
    pub fn custom_config(&self) -> Option<&Path> {
        self.custom_config.as_deref()
    }

    /// The repository config file, if one exists
    pub fn repository_config(&self) -> Option<PathBuf> {
        REPO_CONFIG_STEMS
            .iter()
            .find_map(|stem| find_with_stem(&self.root, stem))
    }

    /// Already-resolved configuration, if any
    pub fn cached(&self) -> Option<Arc<EffectiveConfig>> {
        self.cache.get().cloned()
    }

    /// Resolve the effective configuration, once per resolver
    pub fn resolve(
        &self,
        project_type: Option<ProjectType>,
        overrides: Option<&Value>,
    ) -> Result<Arc<EffectiveConfig>> {
        if let Some(config) = self.cache.get() {
            tracing::trace!("CONFIG: returning cached configuration");
            return Ok(Arc::clone(config));
        }

        let config = Arc::new(self.build(project_type, overrides)?);
        Ok(Arc::clone(self.cache.get_or_init(|| config)))
    }

    fn build(
        &self,
        explicit_type: Option<ProjectType>,
        overrides: Option<&Value>,
    ) -> Result<EffectiveConfig> {
        let environment = self.env.environment();
        let project_type = explicit_type.unwrap_or_else(|| detect_project_type(&self.root));
        tracing::debug!("CONFIG: environment={environment} project={project_type}");

        let base = load_str(BASE_CONFIG, ConfigFormat::Toml)
            .context("Built-in base configuration is invalid")?;
        let env_layer = self.environment_layer(environment)?;
        let project_layer = self.project_layer(project_type)?;
        let user_layer = self.user_layer(overrides);

        let layers = [base, env_layer, project_layer, user_layer].map(normalize_layer);
        let merged = merge_layers(layers.iter());
        match self.finish(merged, environment, project_type) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Merged configuration is invalid, using defaults: {e:#}");
                let fallback = merge(&layers[0], &layers[1]);
                self.finish(fallback, environment, project_type)
                    .context("Default configuration is invalid")
            }
        }
    }

    fn environment_layer(&self, environment: Environment) -> Result<Value> {
        let preset = load_str(environment_preset(environment), ConfigFormat::Toml)
            .with_context(|| format!("Built-in {environment} preset is invalid"))?;
        Ok(merge(&preset, &self.env.toggles_overlay()))
    }

    fn project_layer(&self, project_type: ProjectType) -> Result<Value> {
        let preset = project_preset(project_type)
            .map(|text| {
                load_str(text, ConfigFormat::Toml)
                    .with_context(|| format!("Built-in {project_type} preset is invalid"))
            })
            .transpose()?;

        let overlay_dir = self.root.join(".hookforge").join("projects");
        let overlay =
            find_with_stem(&overlay_dir, project_type.as_str()).map(|path| load_optional(&path));

        match (preset, overlay) {
            (Some(preset), Some(overlay)) => Ok(merge(&preset, &overlay)),
            (Some(layer), None) | (None, Some(layer)) => Ok(layer),
            (None, None) => {
                tracing::warn!(
                    "No project overlay for {project_type}, using environment defaults \
                     (add one in {})",
                    overlay_dir.display()
                );
                Ok(empty())
            }
        }
    }

    fn user_layer(&self, overrides: Option<&Value>) -> Value {
        let mut layers = Vec::new();

        if let Some(path) = self
            .user_config_dir
            .as_deref()
            .and_then(|dir| find_with_stem(dir, "config"))
        {
            layers.push(load_optional(&path));
        }
        if let Some(path) = self.repository_config() {
            layers.push(load_optional(&path));
        }
        if let Some(path) = &self.custom_config {
            if path.is_file() {
                layers.push(load_optional(path));
            } else {
                tracing::warn!("Config file {} not found, ignoring", path.display());
            }
        }
        if let Some(overrides) = overrides {
            layers.push(overrides.clone());
        }

        merge_layers(layers.iter())
    }

    fn finish(
        &self,
        merged: Value,
        environment: Environment,
        project_type: ProjectType,
    ) -> Result<EffectiveConfig> {
        let Value::Object(mut tree) = merged else {
            anyhow::bail!("configuration root must be a mapping");
        };

        post_process(&mut tree);

        tree.insert(
            "meta".to_string(),
            json!({
                "projectType": project_type.as_str(),
                "environment": environment.as_str(),
                "generatedAt": Utc::now().to_rfc3339(),
            }),
        );
        let advanced = tree.remove("advanced").unwrap_or_else(empty);
        tree.insert(
            "advanced".to_string(),
            merge(&advanced, &json!({ "env": self.env.relevant() })),
        );

        serde_json::from_value(Value::Object(tree)).context("Configuration does not match schema")
    }
}

/// Fold `*Defaults` sections and dedupe check lists
pub fn post_process(tree: &mut Map<String, Value>) {
    fold_defaults(tree);

    for (section, _) in SECTIONS {
        let checks = tree
            .get_mut(*section)
            .and_then(|s| s.get_mut("checks"))
            .and_then(Value::as_array_mut);
        if let Some(checks) = checks {
            let unique = dedupe(std::mem::take(checks));
            *checks = unique;
        }
    }
}

/// Fold each `*Defaults` section beneath its section of the same layer
fn fold_defaults(tree: &mut Map<String, Value>) {
    for (section, defaults_key) in SECTIONS {
        if let Some(defaults) = tree.remove(*defaults_key) {
            let current = tree.remove(*section).unwrap_or_else(empty);
            tree.insert(section.to_string(), merge(&defaults, &current));
        }
    }
}

fn normalize_layer(mut layer: Value) -> Value {
    if let Some(tree) = layer.as_object_mut() {
        fold_defaults(tree);
    }
    layer
}

fn load_optional(path: &Path) -> Value {
    match load_file(path) {
        Ok(value) => {
            tracing::debug!("CONFIG: loaded {}", path.display());
            value
        }
        Err(e) => {
            tracing::warn!("Failed to load {}, skipping: {e}", path.display());
            empty()
        }
    }
}

fn empty() -> Value {
    Value::Object(Map::new())
}
