//! Cache error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache entry not found: {0}")]
    NotFound(String),

    #[error("Cache entry expired: {0}")]
    Expired(String),

    #[error("Cache entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid cache key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache file error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for the two "nothing usable under this key" outcomes of a read.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::Expired(_))
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
