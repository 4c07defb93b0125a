//! Built-in configuration presets, embedded at compile time.

use super::environment::Environment;
use super::project::ProjectType;

// Embed the default config at compile time
pub const BASE_CONFIG: &str = include_str!("../../defaults/base.toml");

const DEVELOPMENT: &str = include_str!("../../defaults/environments/development.toml");
const PRODUCTION: &str = include_str!("../../defaults/environments/production.toml");
const CI: &str = include_str!("../../defaults/environments/ci.toml");
const TEST: &str = include_str!("../../defaults/environments/test.toml");

const NEXTJS: &str = include_str!("../../defaults/projects/nextjs.toml");
const NUXT: &str = include_str!("../../defaults/projects/nuxt.toml");
const ANGULAR: &str = include_str!("../../defaults/projects/angular.toml");
const SVELTE: &str = include_str!("../../defaults/projects/svelte.toml");
const VUE: &str = include_str!("../../defaults/projects/vue.toml");
const REACT: &str = include_str!("../../defaults/projects/react.toml");
const NODE: &str = include_str!("../../defaults/projects/node.toml");
const RUST: &str = include_str!("../../defaults/projects/rust.toml");

/// Environment overlay preset (TOML)
pub fn environment_preset(environment: Environment) -> &'static str {
    match environment {
        Environment::Development => DEVELOPMENT,
        Environment::Production => PRODUCTION,
        Environment::Ci => CI,
        Environment::Test => TEST,
    }
}

/// Project overlay preset (TOML); `common` has none
pub fn project_preset(project_type: ProjectType) -> Option<&'static str> {
    match project_type {
        ProjectType::NextJs => Some(NEXTJS),
        ProjectType::Nuxt => Some(NUXT),
        ProjectType::Angular => Some(ANGULAR),
        ProjectType::Svelte => Some(SVELTE),
        ProjectType::Vue => Some(VUE),
        ProjectType::React => Some(REACT),
        ProjectType::Node => Some(NODE),
        ProjectType::Rust => Some(RUST),
        ProjectType::Common => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::EffectiveConfig;
    use crate::config::smart_load::{ConfigFormat, load_str};

    #[test]
    fn test_every_preset_parses() {
        let base = load_str(BASE_CONFIG, ConfigFormat::Toml).unwrap();
        let config: EffectiveConfig = serde_json::from_value(base).unwrap();
        assert_eq!(config.pre_commit.checks.len(), 2);
        assert_eq!(config.commit_msg.max_length, Some(100));

        for env in [
            Environment::Development,
            Environment::Production,
            Environment::Ci,
            Environment::Test,
        ] {
            assert!(load_str(environment_preset(env), ConfigFormat::Toml).is_ok(), "{env}");
        }

        for project_type in ProjectType::ALL {
            if let Some(preset) = project_preset(*project_type) {
                assert!(load_str(preset, ConfigFormat::Toml).is_ok(), "{project_type}");
            }
        }
    }
}
