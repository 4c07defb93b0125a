//! Glob pattern utilities
//!
//! Branch names are matched with `globset` using git-style semantics: `*`
//! never crosses a `/`, `**` does.

use anyhow::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Matches branch names against a list of glob patterns
#[derive(Debug, Clone)]
pub struct BranchMatcher {
    patterns: Vec<String>,
    set: GlobSet,
}

impl BranchMatcher {
    /// Build a matcher from configured patterns
    pub fn new(patterns: &[String]) -> Result<Self> {
        Ok(Self {
            patterns: patterns.to_vec(),
            set: build_globset(patterns)?,
        })
    }

    /// Whether any pattern matches the branch
    pub fn is_match(&self, branch: &str) -> bool {
        self.set.is_match(branch)
    }

    /// The pattern that matched first, for reporting
    pub fn first_match(&self, branch: &str) -> Option<&str> {
        self.set
            .matches(branch)
            .first()
            .map(|&index| self.patterns[index].as_str())
    }
}

/// Create a GlobSet where `*` stops at path separators
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern).literal_separator(true).build()?;
        builder.add(glob);
    }

    Ok(builder.build()?)
}
