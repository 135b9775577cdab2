use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// DataError – failures that must reach the caller
// ---------------------------------------------------------------------------

/// Hard failures raised while reading local data.
///
/// Everything that is merely "no data" (unknown season, player without rows,
/// missing optional columns) is reported through empty results instead.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl DataError {
    pub fn csv(path: &Path, source: csv::Error) -> Self {
        DataError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The file the failure is attributed to.
    pub fn path(&self) -> &Path {
        match self {
            DataError::Io { path, .. } | DataError::Csv { path, .. } | DataError::Config { path, .. } => path,
        }
    }
}
