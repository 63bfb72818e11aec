//! HTTP JSON fetcher
//!
//! A thin reqwest wrapper implementing [`MetadataFetcher`]. Requests are single-shot:
//! thumbnail metadata is cosmetic, so failures are reported and never retried.

use async_trait::async_trait;
use embed_core::{MetadataError, MetadataFetcher};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors from the HTTP fetcher
#[derive(Debug, Error)]
pub enum Error {
    /// Transport or client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Body was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Header name or value rejected by the client
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Result type for fetcher operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for MetadataError {
    fn from(error: Error) -> Self {
        match error {
            Error::Status { status, .. } => MetadataError::Status(status),
            Error::Json(e) => MetadataError::Decode(e.to_string()),
            Error::Http(e) if e.is_decode() => MetadataError::Decode(e.to_string()),
            other => MetadataError::Network(other.to_string()),
        }
    }
}

/// Configuration for [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Headers sent with every request
    pub default_headers: HashMap<String, String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("lazy-embed/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl FetcherConfig {
    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

/// JSON-over-HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher from configuration
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (key, value) in &config.default_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| Error::InvalidHeader(key.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(key.clone()))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// GET `url` and parse the body as JSON
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        tracing::debug!(url, "fetching metadata");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MetadataFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> std::result::Result<serde_json::Value, MetadataError> {
        self.get_json(url).await.map_err(MetadataError::from)
    }
}
