use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Directories searched when the configured data directory does not exist.
const FALLBACK_DATA_DIRS: [&str; 4] = ["nba_data", "./nba_data", "datasets", "./datasets"];

/// Name of the optional nested directory that holds the CSV files.
const DATASETS_SUBDIR: &str = "datasets";

// ---------------------------------------------------------------------------
// AnalyzerConfig
// ---------------------------------------------------------------------------

/// Tunables for scanning, loading and the seeded heuristics.
///
/// Every field has a default, so a JSON override file only needs the keys it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Root directory holding the raw CSV files.
    pub data_dir: PathBuf,
    /// Rows sampled per shotdetail file to detect its season.
    pub season_sample_rows: usize,
    /// Rows sampled by [`crate::data::season::SeasonIndex::verify_season`].
    pub verify_sample_rows: usize,
    /// Rows buffered per chunk while streaming a player's shots.
    pub chunk_size: usize,
    /// Seed for every pseudo-random heuristic.
    pub seed: u64,
    /// Whether player loads include the playoff file by default.
    pub include_playoffs: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("nba_data"),
            season_sample_rows: 1000,
            verify_sample_rows: 100,
            chunk_size: 10_000,
            seed: 42,
            include_playoffs: true,
        }
    }
}

impl AnalyzerConfig {
    /// Config rooted at `data_dir`, everything else default.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load overrides from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| DataError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Locate the directory that actually holds the CSV files.
    ///
    /// Tries the configured directory first, then the usual fallbacks. A
    /// nested `datasets/` directory wins over its parent. `None` means no
    /// candidate exists at all.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        let base = if self.data_dir.is_dir() {
            self.data_dir.clone()
        } else {
            log::warn!("Data directory not found: {}", self.data_dir.display());
            let found = FALLBACK_DATA_DIRS
                .iter()
                .map(PathBuf::from)
                .find(|p| p.is_dir());
            match found {
                Some(alt) => {
                    log::info!("Using alternative data directory: {}", alt.display());
                    alt
                }
                None => {
                    log::error!("No data directory found in any location");
                    return None;
                }
            }
        };

        let nested = base.join(DATASETS_SUBDIR);
        if nested.is_dir() {
            log::info!("Using datasets subdirectory: {}", nested.display());
            Some(nested)
        } else {
            Some(base)
        }
    }
}
