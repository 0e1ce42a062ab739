//! DB-API inspired error taxonomy.
//!
//! - `ClosedConnection` / `ClosedCursor`: guarded operation after `close()`
//! - `Interface`: driver misuse, bad arguments
//! - `Operational`: connection lost, service unavailable
//! - `Programming`: SQL misuse, fetching without a query
//! - `Data`: value conversion issues
//! - `Client`: underlying client errors, propagated verbatim

use thiserror::Error;

/// Error produced by the connectivity layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Any guarded operation invoked after the connection was closed.
    #[error("Operating on a closed connection.")]
    ClosedConnection,

    /// Any guarded operation invoked after the cursor was closed.
    #[error("Operating on a closed cursor.")]
    ClosedCursor,

    /// Interface error (driver misuse, bad arguments).
    #[error("InterfaceError: {0}")]
    Interface(String),

    /// Operational error (connection lost, service unavailable).
    #[error("OperationalError: {0}")]
    Operational(String),

    /// Programming error (SQL misuse, fetching without a query).
    #[error("ProgrammingError: {0}")]
    Programming(String),

    /// Data error (value conversion issues).
    #[error("DataError: {0}")]
    Data(String),

    /// Error from the underlying service clients, unmodified.
    #[error(transparent)]
    Client(#[from] quarry_client::Error),
}

impl Error {
    /// Create an interface error.
    #[must_use]
    pub fn interface(msg: impl Into<String>) -> Self {
        Self::Interface(msg.into())
    }

    /// Create an operational error.
    #[must_use]
    pub fn operational(msg: impl Into<String>) -> Self {
        Self::Operational(msg.into())
    }

    /// Create a programming error.
    #[must_use]
    pub fn programming(msg: impl Into<String>) -> Self {
        Self::Programming(msg.into())
    }

    /// Create a data error.
    #[must_use]
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }
}

/// Result type alias for connectivity operations.
pub type Result<T> = std::result::Result<T, Error>;
