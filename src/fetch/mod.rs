//! Transport seam for metadata endpoints.
//!
//! The core never opens a socket itself: everything goes through a [`Fetcher`]
//! handed to the resolver. [`HttpFetcher`] is the stock implementation, using
//! `reqwest` for `http(s)://` endpoints and `tokio::fs` for `file://` endpoints.
//! Tests substitute a scripted fetcher.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Why one endpoint did not produce usable metadata.
///
/// Always recovered inside the resolver, which moves on to the next candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS or I/O failure.
    #[error("Transport error for {endpoint}: {reason}")]
    Transport {
        /// Endpoint being fetched
        endpoint: String,
        /// Underlying error message
        reason: String,
    },

    /// The fetch did not complete within its timeout.
    #[error("Timed out after {timeout:?} fetching {endpoint}")]
    Timeout {
        /// Endpoint being fetched
        endpoint: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// The server answered with a non-success status.
    #[error("HTTP status {status} from {endpoint}")]
    Status {
        /// Endpoint being fetched
        endpoint: String,
        /// HTTP status code
        status: u16,
    },

    /// The payload is not a JSON object.
    #[error("Malformed payload: {reason}")]
    Malformed {
        /// What was wrong with the payload
        reason: String,
    },

    /// The payload carries an explicit `error` or `code` marker.
    #[error("Source reported an error: {message}")]
    ErrorMarker {
        /// The marker's value
        message: String,
    },

    /// No transport handles this endpoint's scheme.
    #[error("Unsupported endpoint: {endpoint}")]
    UnsupportedEndpoint {
        /// Offending endpoint
        endpoint: String,
    },
}

/// Boxed future returned by [`Fetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>>;

/// Fetch raw bytes for one endpoint.
///
/// Implementations should honor `timeout`; the resolver also bounds every call
/// with its own timer, so one that ignores it still cannot stall a resolution.
pub trait Fetcher: Send + Sync {
    /// Fetch `endpoint`, giving up after `timeout`.
    fn fetch<'a>(&'a self, endpoint: &'a str, timeout: Duration) -> FetchFuture<'a>;
}

/// [`Fetcher`] over HTTP(S) and local `file://` URLs.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with its own HTTP client.
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Create a fetcher sharing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
        }
    }

    async fn fetch_http(&self, endpoint: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let response =
            self.client.get(endpoint).timeout(timeout).send().await.map_err(|e| classify(endpoint, timeout, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| classify(endpoint, timeout, &e))?;
        Ok(body.to_vec())
    }

    async fn fetch_file(endpoint: &str, path: PathBuf) -> Result<Vec<u8>, FetchError> {
        tokio::fs::read(&path).await.map_err(|e| FetchError::Transport {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, endpoint: &'a str, timeout: Duration) -> FetchFuture<'a> {
        Box::pin(async move {
            debug!("Fetching {}", endpoint);
            if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                self.fetch_http(endpoint, timeout).await
            } else if let Some(path) = endpoint.strip_prefix("file://") {
                Self::fetch_file(endpoint, PathBuf::from(path)).await
            } else {
                Err(FetchError::UnsupportedEndpoint {
                    endpoint: endpoint.to_string(),
                })
            }
        })
    }
}

fn classify(endpoint: &str, timeout: Duration, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            endpoint: endpoint.to_string(),
            timeout,
        }
    } else {
        FetchError::Transport {
            endpoint: endpoint.to_string(),
            reason: error.to_string(),
        }
    }
}
