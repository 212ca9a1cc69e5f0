//! Common error types for hoopdata

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for hoopdata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across hoopdata crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable state could not be read or written
    #[error("Persistence error at {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an error with the path of the file being persisted
    pub fn persistence(path: impl Into<PathBuf>, source: impl Into<Error>) -> Self {
        Error::Persistence {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }
}
