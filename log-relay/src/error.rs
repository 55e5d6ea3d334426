//! Error types for the log relay

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Identifier is not on the allow-list
    #[error("unknown identifier: {0}")]
    Unauthorized(String),

    /// Identifier cannot be used as a store name
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start server: {0}")]
    Bind(String),

    #[error("failed to build relay client: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
