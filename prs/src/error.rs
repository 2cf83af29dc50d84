use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrsError {
    #[error("malformed input: {0}")]
    InputMalformed(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("corrupt artifact {}: {reason}", .path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Parameters(#[from] ckks::ParameterError),

    #[error(transparent)]
    Eval(#[from] ckks::EvalError),
}

pub type Result<T> = std::result::Result<T, PrsError>;

impl PrsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrsError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PrsError::CorruptArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
