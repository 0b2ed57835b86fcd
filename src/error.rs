use std::path::PathBuf;
use thiserror::Error;

/// Errors from the file-facing layers: config files, presets and exports.
/// The simulation engine itself never fails.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to encode gif: {0}")]
    Gif(#[from] gif::EncodingError),

    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("nothing to export: field is {width}x{height}")]
    EmptyField { width: usize, height: usize },
}

impl SimError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
