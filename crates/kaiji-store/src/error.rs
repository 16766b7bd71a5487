use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("listing file not found: {0}")]
    ListingNotFound(PathBuf),

    #[error("unexpected listing header in {path}: {found:?}")]
    ListingHeader { path: PathBuf, found: Vec<String> },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The alert store exists but does not parse. Never retried automatically:
    /// the operator has to restore or repair the file.
    #[error("alert store {path} is corrupt and must be repaired by hand: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
