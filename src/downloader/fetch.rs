//! Fetch unit: one URL retrieval against the HTTP transport.

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};

/// Abstraction over single-URL retrieval, enabling testability.
///
/// Implementations must return promptly with [`FetchError::Cancelled`] once
/// `cancel` fires, and must not retry: one failure is final for that URL.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve `url`, returning the full body on a 2xx response
    async fn fetch(&self, cancel: &CancellationToken, url: &str)
    -> std::result::Result<Vec<u8>, FetchError>;
}

/// Production [`Fetcher`] backed by a shared reqwest client.
///
/// The client carries the per-call timeout from [`FetchConfig::request_timeout`];
/// that timeout covers connecting, sending, and reading the body.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the configured timeout and user agent
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn retrieve(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            // An unreadable error body still fails the fetch, just without the body text
            let body = response.text().await.ok();
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(body.to_vec())
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: url.to_string(),
            });
        }

        // Dropping the request future aborts the connection
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled {
                url: url.to_string(),
            }),
            result = self.retrieve(url) => result,
        }
    }
}
