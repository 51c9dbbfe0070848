//! Error Types
//!
//! Every fallible operation in the crate reports through [`Error`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed header, truncated payload, field count mismatch or bad token
    #[error("Format error: {0}")]
    Format(String),

    #[error("Word not in vocabulary: {0}")]
    KeyNotFound(String),

    #[error("Training requested but no hidden-layer model is loaded")]
    ModelMissing,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Duplicate word in vocabulary: {0}")]
    DuplicateWord(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index out of bounds: {index} >= {count}")]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
