//! Settings for indexing and resolution
//!
//! Settings come from an optional `keyref.toml` in the workspace root;
//! every field has a default so a missing or partial file is fine.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::MatchFilter;

/// File name probed for settings in a workspace root
pub const SETTINGS_FILE: &str = "keyref.toml";

/// Recognized configuration surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Glob patterns excluded from discovery and from change notifications
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// How resolution narrows the candidate set
    #[serde(default)]
    pub match_filter: MatchFilter,

    /// Drop matches from workspace roots other than the querying document's
    #[serde(default = "default_isolate")]
    pub isolate_workspace_folders: bool,

    /// Debounce window for coalescing change notifications, per document
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_exclude_patterns() -> Vec<String> {
    [
        "**/node_modules/**",
        "**/.git/**",
        "**/.venv/**",
        "**/venv/**",
        "**/__pycache__/**",
        "**/target/**",
        "**/.tox/**",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_isolate() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exclude_patterns: default_exclude_patterns(),
            match_filter: MatchFilter::default(),
            isolate_workspace_folders: default_isolate(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Settings {
    /// Load settings from a workspace root, falling back to defaults when
    /// no settings file exists there
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings: Settings = toml::from_str(&text)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;

        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Compile the exclusion patterns into a matcher
    pub fn exclusion_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {pattern}"))?;
            builder.add(glob);
        }
        builder.build().context("Failed to build exclusion set")
    }
}
