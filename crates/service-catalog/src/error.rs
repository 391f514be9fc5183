//! Error types for the service catalog

use thiserror::Error;

/// Service catalog error type
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error while talking to the registry
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Registry answered with a non-success status
    #[error("Unexpected registry response {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// Registry response carried no usable index
    #[error("Invalid catalog index: {0}")]
    InvalidIndex(String),

    /// Registry is not reachable
    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
