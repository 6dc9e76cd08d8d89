//! Error types for scope building.

use thiserror::Error;

/// Errors raised while building a scope.
///
/// Builders fail at construction time and never return a partial relation.
/// Errors from executing the generated SQL (for instance a value that does
/// not match the inferred array cast) surface from the executor unchanged.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The caller passed an argument of the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Required model or association metadata is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Metadata could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for scope operations.
pub type Result<T> = std::result::Result<T, ScopeError>;
