use serde::Deserialize;

use crate::error::{SearchError, SearchResult};

/// Ranking knobs, loadable from the `[search]` table of a TOML file.
///
/// ```toml
/// [search]
/// worker_threads = 4
/// secondary_ratio = 0.33
/// min_parallel = 64
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Number of scoring threads. `None` uses
    /// [`std::thread::available_parallelism`].
    pub worker_threads: Option<usize>,
    /// Secondary results must score above this fraction of the best score.
    pub secondary_ratio: f32,
    /// Candidate count below which scoring stays on the calling thread.
    pub min_parallel: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            worker_threads: None,
            secondary_ratio: 0.33,
            min_parallel: 64,
        }
    }
}

#[derive(Deserialize)]
struct SettingsFile {
    #[serde(default)]
    search: SearchSettings,
}

impl SearchSettings {
    pub fn from_toml_str(content: &str) -> SearchResult<Self> {
        let file: SettingsFile =
            toml::from_str(content).map_err(|e| SearchError::Settings(e.to_string()))?;
        file.search.validate()
    }

    fn validate(self) -> SearchResult<Self> {
        if !(0.0..=1.0).contains(&self.secondary_ratio) {
            return Err(SearchError::Settings(format!(
                "secondary_ratio must be within 0..=1, got {}",
                self.secondary_ratio
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(SearchError::Settings("worker_threads must be at least 1".into()));
        }
        Ok(self)
    }

    /// Worker count actually used.
    pub fn effective_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
