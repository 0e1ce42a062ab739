//! Clients for the Quarry analytical database.
//!
//! This crate provides the service-facing building blocks used by the
//! `quarry-dbc` connectivity layer:
//!
//! - [`Client`]: REST client for submitting queries and paging through results
//! - [`BulkReadClient`]: accelerated result fetch as Arrow record batches over
//!   a dedicated transport channel
//! - [`ClientConfig`]: configuration, including discovery from environment
//!   variables
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_client::{Client, ClientConfig, QueryRequest};
//!
//! let config = ClientConfig::new("https://quarry.example.com", "key", "my-project")?;
//! let client = Client::with_config(config)?;
//! let response = client.query(&QueryRequest::new("SELECT 1"))?;
//! ```
#![warn(missing_docs)]

pub mod bulk;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use bulk::{BatchStream, BulkReadClient, TransportChannel};
pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use types::{
    FieldSchema, FieldType, ParameterValue, QueryParameter, QueryRequest, QueryResponse,
    ResultsPage, TableSchema,
};
