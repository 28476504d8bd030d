//! Common error types for RUClasses
//!
//! Every fallible operation in the library returns [`Result`]. The HTTP layer
//! turns each variant into a transient notice for the user; nothing here is
//! fatal to the process.

use thiserror::Error;

use crate::identity::AuthError;
use crate::validate::ValidationError;

/// Common result type for RUClasses operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across RUClasses crates
#[derive(Error, Debug)]
pub enum Error {
    /// Review draft rejected before anything was written
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Sign-in or session failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Document store operation error (wraps sqlx::Error)
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested document not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller does not own the document it tried to mutate
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed collection or document path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures that came from the document store rather than the caller
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::Serialization(_) | Error::Io(_) | Error::Internal(_)
        )
    }
}
