//! Error types for ragproxy

use thiserror::Error;

/// Result type alias for ragproxy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ragproxy operations
#[derive(Error, Debug)]
pub enum Error {
    /// The embedding provider failed to produce a vector
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The generation provider failed to produce text
    #[error("generation error: {0}")]
    Generation(String),

    /// An embedding's length disagrees with the index dimension
    #[error("dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The caller cancelled the query between pipeline stages
    #[error("query cancelled")]
    Cancelled,

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` if the error was raised by an embedding or generation provider.
    #[must_use]
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Embedding(_) | Self::Generation(_))
    }
}
