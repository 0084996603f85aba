//! Common error types for Stemgate

use thiserror::Error;

/// Common result type for Stemgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Stemgate services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error against a collaborator service
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
