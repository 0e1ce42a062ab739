//! DB-API style connectivity for the Quarry analytical database.
//!
//! This crate adapts the `quarry-client` REST client (and its optional
//! accelerated bulk-read client) to the familiar connection/cursor pattern:
//!
//! - [`Connection`] / [`connect`]: tracks which underlying clients it created,
//!   and therefore which ones it must close, and cascade-closes the cursors
//!   produced through it
//! - [`Cursor`]: query execution and buffered row fetching, with transparent
//!   fallback from the accelerated bulk-read path to REST pagination
//! - [`Error`]: DB-API inspired error taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_dbc::connect;
//!
//! let conn = connect(None, None)?;
//! let cursor = conn.cursor()?;
//! cursor.execute("SELECT name, size FROM quarries", &[])?;
//! while let Some(row) = cursor.fetchone()? {
//!     println!("{row:?}");
//! }
//! conn.close()?;
//! ```
#![warn(missing_docs)]

pub mod connection;
pub mod cursor;
pub mod error;
pub mod rows;

pub use connection::{Connection, connect};
pub use cursor::{ColumnDescription, Cursor, DEFAULT_ARRAYSIZE};
pub use error::{Error, Result};
pub use rows::Row;

// Callers bind parameters with the client's value type directly.
pub use quarry_client::ParameterValue;
