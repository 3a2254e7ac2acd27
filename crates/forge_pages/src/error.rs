//! Error types for the page store.

use thiserror::Error;

/// Result type alias for page store operations.
pub type PageResult<T> = Result<T, PageError>;

/// Errors that can occur while reading or writing page data.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Page {0} not found")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}
