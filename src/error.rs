//! Agent error types

use thiserror::Error;

/// Agent error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache store error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Install attempt failed; the phase stays `installing`
    #[error("Install failed: {0}")]
    Install(String),

    /// Event arrived in the wrong lifecycle phase
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Network fetch error
    #[error("Network error: {0}")]
    Network(String),

    /// Push payload error
    #[error("Payload error: {0}")]
    Payload(String),

    /// Host (display / window) error
    #[error("Host error: {0}")]
    Host(String),

    /// Notifications API error
    #[error("API error: {0}")]
    Api(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, Error>;
