//! Project type detection
//!
//! Marker files are checked first, then the dependencies declared in
//! `package.json`. Detection never fails: anything unexpected resolves to
//! [`ProjectType::Common`].

use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectType {
    NextJs,
    Nuxt,
    Angular,
    Svelte,
    Vue,
    React,
    Node,
    Rust,
    Common,
}

impl ProjectType {
    pub const ALL: &'static [ProjectType] = &[
        ProjectType::NextJs,
        ProjectType::Nuxt,
        ProjectType::Angular,
        ProjectType::Svelte,
        ProjectType::Vue,
        ProjectType::React,
        ProjectType::Node,
        ProjectType::Rust,
        ProjectType::Common,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::NextJs => "nextjs",
            ProjectType::Nuxt => "nuxt",
            ProjectType::Angular => "angular",
            ProjectType::Svelte => "svelte",
            ProjectType::Vue => "vue",
            ProjectType::React => "react",
            ProjectType::Node => "node",
            ProjectType::Rust => "rust",
            ProjectType::Common => "common",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let alias = match lowered.as_str() {
            "next" => "nextjs",
            "sveltekit" => "svelte",
            "generic" => "common",
            other => other,
        };
        ProjectType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == alias)
            .ok_or_else(|| format!("unknown project type '{s}'"))
    }
}

/// Marker files, most specific first
const MARKERS: &[(&str, ProjectType)] = &[
    ("next.config.js", ProjectType::NextJs),
    ("next.config.mjs", ProjectType::NextJs),
    ("next.config.ts", ProjectType::NextJs),
    ("nuxt.config.js", ProjectType::Nuxt),
    ("nuxt.config.ts", ProjectType::Nuxt),
    ("angular.json", ProjectType::Angular),
    ("svelte.config.js", ProjectType::Svelte),
    ("svelte.config.ts", ProjectType::Svelte),
    ("vue.config.js", ProjectType::Vue),
    ("Cargo.toml", ProjectType::Rust),
];

/// Dependencies in `package.json`, most specific first
const DEPENDENCY_MARKERS: &[(&str, ProjectType)] = &[
    ("next", ProjectType::NextJs),
    ("nuxt", ProjectType::Nuxt),
    ("@angular/core", ProjectType::Angular),
    ("@sveltejs/kit", ProjectType::Svelte),
    ("svelte", ProjectType::Svelte),
    ("vue", ProjectType::Vue),
    ("react", ProjectType::React),
];

/// Detect project type based on files in the directory
pub fn detect_project_type<P: AsRef<Path>>(path: P) -> ProjectType {
    let path = path.as_ref();

    for (marker, project_type) in MARKERS {
        if path.join(marker).exists() {
            tracing::debug!("Project marker {marker} found, using {project_type}");
            return *project_type;
        }
    }

    let manifest = path.join("package.json");
    if !manifest.exists() {
        return ProjectType::Common;
    }

    let content = match std::fs::read_to_string(&manifest) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Could not read {}: {e}", manifest.display());
            return ProjectType::Common;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(package) => detect_from_manifest(&package),
        Err(e) => {
            tracing::warn!("Ignoring malformed {}: {e}", manifest.display());
            ProjectType::Common
        }
    }
}

fn detect_from_manifest(package: &Value) -> ProjectType {
    let declared = |name: &str| {
        ["dependencies", "devDependencies", "peerDependencies"]
            .iter()
            .any(|section| package.get(section).and_then(|deps| deps.get(name)).is_some())
    };

    DEPENDENCY_MARKERS
        .iter()
        .find(|(name, _)| declared(name))
        .map(|(_, project_type)| *project_type)
        .unwrap_or(ProjectType::Node)
}
