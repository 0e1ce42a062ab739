//! Client configuration, including discovery from environment variables.

use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable names
mod vars {
    pub const QUARRY_ENDPOINT: &str = "QUARRY_ENDPOINT";
    pub const QUARRY_BULK_ENDPOINT: &str = "QUARRY_BULK_ENDPOINT";
    pub const QUARRY_API_KEY: &str = "QUARRY_API_KEY";
    pub const QUARRY_PROJECT: &str = "QUARRY_PROJECT";
    pub const QUARRY_TIMEOUT_SECS: &str = "QUARRY_TIMEOUT_SECS";
}

/// Configuration for [`crate::Client`] and [`crate::BulkReadClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the REST query service.
    pub endpoint: Url,
    /// Base URL of the bulk-read service, if deployed.
    pub bulk_endpoint: Option<Url>,
    /// API key presented as a bearer token.
    pub api_key: String,
    /// Project the queries are billed to.
    pub project: String,
    /// Request timeout applied to both clients.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with the default timeout and no bulk endpoint.
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        project: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("API key cannot be empty"));
        }

        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            bulk_endpoint: None,
            api_key,
            project: project.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the bulk-read endpoint.
    pub fn with_bulk_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.bulk_endpoint = Some(Url::parse(endpoint)?);
        Ok(self)
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from `QUARRY_*` environment variables.
    ///
    /// `QUARRY_ENDPOINT`, `QUARRY_API_KEY` and `QUARRY_PROJECT` are required;
    /// `QUARRY_BULK_ENDPOINT` and `QUARRY_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self> {
        let endpoint = require_var(vars::QUARRY_ENDPOINT)?;
        let api_key = require_var(vars::QUARRY_API_KEY)?;
        let project = require_var(vars::QUARRY_PROJECT)?;

        let mut config = Self::new(&endpoint, api_key, project)?;

        if let Ok(bulk) = env::var(vars::QUARRY_BULK_ENDPOINT) {
            config = config.with_bulk_endpoint(&bulk)?;
        }

        if let Ok(secs_str) = env::var(vars::QUARRY_TIMEOUT_SECS)
            && let Ok(secs) = secs_str.parse::<u64>()
        {
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

// Keeps the API key out of logs and error reports.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("bulk_endpoint", &self.bulk_endpoint.as_ref().map(Url::as_str))
            .field("api_key", &"<redacted>")
            .field("project", &self.project)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn require_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{name} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = ClientConfig::new("https://quarry.example.com", "key", "proj").unwrap();
        assert_eq!(config.endpoint.as_str(), "https://quarry.example.com/");
        assert_eq!(config.project, "proj");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.bulk_endpoint.is_none());
    }

    #[test]
    fn test_config_rejects_empty_api_key() {
        let result = ClientConfig::new("https://quarry.example.com", "  ", "proj");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_config_rejects_invalid_endpoint() {
        let result = ClientConfig::new("not a url", "key", "proj");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_config_with_bulk_endpoint() {
        let config = ClientConfig::new("https://quarry.example.com", "key", "proj")
            .unwrap()
            .with_bulk_endpoint("https://bulk.quarry.example.com")
            .unwrap();
        assert!(config.bulk_endpoint.is_some());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::new("https://quarry.example.com", "secret", "proj").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
