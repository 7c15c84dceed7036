use crate::deepnn::shape::ShapeError;
use crate::mnist::dataset::DatasetError;
use burn::config::ConfigError;
use burn::record::RecorderError;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid model architecture: {0}")]
    Shape(#[from] ShapeError),

    #[error("failed to load the MNIST dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode a summary record: {0}")]
    Json(#[from] serde_json::Error),

    /// Model record (de)serialization failure.
    #[error("failed to (de)serialize the model record at {path:?}")]
    Record {
        path: PathBuf,
        #[source]
        source: RecorderError,
    },

    #[error("failed to load the config at {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// A training setting that cannot describe a run.
    #[error("invalid training config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
