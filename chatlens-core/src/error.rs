//! Error types for chatlens-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the chatlens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Bad selection or unusable input files. The previous selection stays active.
    #[error("input error: {0}")]
    Input(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A single record that could not be read. Loading skips the line and counts it.
    #[error("parse error in {} line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Sender has no records in the active store
    #[error("sender not found: {0}")]
    SenderNotFound(String),
}

/// Result type alias for chatlens-core
pub type Result<T> = std::result::Result<T, Error>;
