//! REST client for the Quarry query service.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;
use url::Url;

use crate::bulk::BulkReadClient;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::{QueryRequest, QueryResponse, ResultsPage};

/// REST client for submitting queries and paging through results.
///
/// The client is inert after [`Client::close`]; every further call fails with
/// [`Error::ClientClosed`]. Closing an already-closed client is itself an
/// error, which makes an unwanted double-close observable to callers.
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    http: reqwest::blocking::Client,
    closed: AtomicBool,
}

impl Client {
    /// Create a client from `QUARRY_*` environment variables.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Create a client from an explicit configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            config,
            http,
            closed: AtomicBool::new(false),
        })
    }

    /// The configuration this client was built from.
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether [`Client::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Submit a query and return the first page of results.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.ensure_open()?;

        let url = join_path(
            &self.config.endpoint,
            &format!("v1/projects/{}/queries", self.config.project),
        )?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()?;

        decode(response)
    }

    /// Fetch a continuation page of a previously submitted query.
    pub fn query_results(&self, job_id: &str, page_token: &str) -> Result<ResultsPage> {
        self.ensure_open()?;

        let url = join_path(
            &self.config.endpoint,
            &format!(
                "v1/projects/{}/queries/{job_id}/results",
                self.config.project
            ),
        )?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.api_key)
            .query(&[("pageToken", page_token)])
            .send()?;

        decode(response)
    }

    /// Close the client. Further calls fail with [`Error::ClientClosed`].
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(Error::ClientClosed);
        }
        Ok(())
    }

    /// Build a [`BulkReadClient`] from this client's configuration.
    ///
    /// Instantiation failure is not an error here: it is logged as a warning
    /// and surfaced as `None`, leaving callers on the REST fetch path.
    pub fn create_bulk_read_client(&self) -> Option<BulkReadClient> {
        match BulkReadClient::from_config(&self.config) {
            Ok(client) => Some(client),
            Err(error) => {
                tracing::warn!(%error, "failed to create bulk read client, result fetches stay on the REST path");
                None
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ClientClosed);
        }
        Ok(())
    }
}

/// Join a relative path onto a base endpoint, tolerating trailing slashes.
pub(crate) fn join_path(endpoint: &Url, path: &str) -> Result<Url> {
    let base = endpoint.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

fn decode<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: response.text().unwrap_or_default(),
        });
    }
    Ok(response.json()?)
}
