//! Error types for poetry-search

use thiserror::Error;

/// Result type alias for poetry-search operations
pub type Result<T> = std::result::Result<T, PoetryError>;

/// Main error type for poetry-search
///
/// Nothing inside the search path returns these to callers: persistence
/// failures are logged and absorbed by the cache and history. They surface
/// from the storage backends themselves, from corpus loading and from the CLI.
#[derive(Error, Debug)]
pub enum PoetryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Poem not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PoetryError {
    /// Whether the error came from the persistence layer and may succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, PoetryError::Storage(_) | PoetryError::Io(_))
    }
}
