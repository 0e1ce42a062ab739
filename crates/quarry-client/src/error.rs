//! Error types for the Quarry clients.

use thiserror::Error;

/// Error produced by the Quarry REST and bulk-read clients.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or incomplete client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed endpoint URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP transport failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success response from the service.
    #[error("service error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error body as returned by the service.
        message: String,
    },

    /// Failure while decoding a bulk-read Arrow stream.
    #[error("bulk read error: {0}")]
    BulkRead(String),

    /// Operation on a client that has been closed.
    #[error("client is closed")]
    ClientClosed,

    /// Operation on a transport channel that has been closed.
    #[error("transport channel is closed")]
    ChannelClosed,
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a bulk read error.
    #[must_use]
    pub fn bulk_read(msg: impl Into<String>) -> Self {
        Self::BulkRead(msg.into())
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
