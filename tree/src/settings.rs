use std::path::Path;

use serde::Deserialize;

use crate::error::{TreeError, TreeResult};

/// Tree behaviour knobs, loadable from the `[tree]` table of a TOML file.
///
/// ```toml
/// [tree]
/// coalesce_rebuilds = true
/// max_depth = 16
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    /// Merge rebuild requests for the same path while they are pending.
    pub coalesce_rebuilds: bool,
    /// Nodes deeper than this are not expanded.
    pub max_depth: usize,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            coalesce_rebuilds: true,
            max_depth: 16,
        }
    }
}

#[derive(Deserialize)]
struct SettingsFile {
    #[serde(default)]
    tree: TreeSettings,
}

impl TreeSettings {
    pub fn from_toml_str(content: &str) -> TreeResult<Self> {
        toml::from_str::<SettingsFile>(content)
            .map(|file| file.tree)
            .map_err(|e| TreeError::Settings(e.to_string()))
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> TreeResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TreeError::Settings(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}
