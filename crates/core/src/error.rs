//! Error types for the joinery tokenizer library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tokenizer library.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Invalid configuration (unknown mode or alphabet, conflicting model paths, ...)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A model, vocabulary or dictionary file is missing or malformed
    #[error("Failed to load {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Operation not allowed in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error during subword training
    #[error("Training error: {0}")]
    Training(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TokenizerError {
    /// Build an [`TokenizerError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }

    /// Build a [`TokenizerError::ModelLoad`] for the given path.
    pub fn model_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
