//! Error types for the skip-gram trainer.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for skip-gram operations.
#[derive(Error, Debug)]
pub enum SkipGramError {
    /// The corpus is empty or too short for the requested window.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Error during training.
    #[error("Training error: {0}")]
    Training(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid artifact format.
    #[error("Invalid artifact format: {0}")]
    InvalidArtifactFormat(String),

    /// Word not found in vocabulary.
    #[error("Word not found in vocabulary: {0}")]
    WordNotFound(String),

    /// Index out of bounds.
    #[error("Index out of bounds: {index} >= {max}")]
    IndexOutOfBounds {
        /// The index that was out of bounds.
        index: usize,
        /// The maximum allowed index.
        max: usize,
    },

    /// Tensor shapes disagree.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected `(rows, cols)`.
        expected: (usize, usize),
        /// The shape actually found.
        actual: (usize, usize),
    },
}

/// Result type alias for skip-gram operations.
pub type Result<T> = std::result::Result<T, SkipGramError>;

impl From<bincode::Error> for SkipGramError {
    fn from(err: bincode::Error) -> Self {
        SkipGramError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SkipGramError {
    fn from(err: serde_json::Error) -> Self {
        SkipGramError::Serialization(err.to_string())
    }
}
