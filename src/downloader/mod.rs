//! Core downloader implementation split into focused submodules.
//!
//! The `BatchDownloader` struct and its supporting pieces are organized by concern:
//! - [`fetch`] - Single-URL retrieval (the transport seam)
//! - [`pool`] - Shared task queue and the per-batch worker loop
//! - [`orchestrator`] - Fail-fast batch decision and cancellation
//! - [`lifecycle`] - Graceful shutdown coordination

pub mod fetch;
mod lifecycle;
pub mod orchestrator;
mod pool;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::admission::{AdmissionGuard, AdmissionLimiter};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{DownloadedUrl, DownloaderStats};

pub use fetch::{Fetcher, HttpFetcher};
pub use orchestrator::BatchOrchestrator;

/// Main downloader instance
///
/// Owns the process-wide admission limiter and the batch orchestrator. Share
/// it across request handlers behind an `Arc`.
pub struct BatchDownloader {
    /// Configuration (wrapped in Arc for sharing with the API layer)
    pub(crate) config: Arc<Config>,
    /// Admission control shared by every request
    limiter: Arc<AdmissionLimiter>,
    /// Runs admitted batches
    orchestrator: BatchOrchestrator,
    /// Root of every batch token; cancelled on shutdown
    shutdown_token: CancellationToken,
}

impl BatchDownloader {
    /// Create a downloader fetching over HTTP
    ///
    /// Validates the configuration and builds the shared reqwest client with
    /// the configured per-fetch timeout.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Create a downloader over a custom [`Fetcher`]
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let limiter = AdmissionLimiter::new(config.admission.max_concurrent_clients);
        let orchestrator = BatchOrchestrator::new(fetcher, config.fetch.worker_count);

        Self {
            config: Arc::new(config),
            limiter,
            orchestrator,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Admit one batch, or fail immediately if the process is at capacity
    ///
    /// The returned guard must be held for the whole batch; dropping it
    /// releases the admission.
    pub fn admit(&self) -> Result<AdmissionGuard> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        self.limiter.try_acquire().inspect_err(|_| {
            tracing::warn!(
                in_flight = self.limiter.in_flight(),
                max = self.limiter.max_concurrent(),
                "Admission denied, max parallel requests reached"
            );
        })
    }

    /// Run an admitted batch
    ///
    /// Rejects batches over `max_urls_per_request`, then fetches every URL
    /// concurrently. Succeeds only if every URL succeeds.
    pub async fn run_batch(
        &self,
        _admission: &AdmissionGuard,
        urls: Vec<String>,
    ) -> Result<Vec<DownloadedUrl>> {
        let max = self.config.fetch.max_urls_per_request;
        if urls.len() > max {
            return Err(Error::TooManyUrls {
                count: urls.len(),
                max,
            });
        }

        let fetched = self.orchestrator.run(&self.shutdown_token, urls).await?;
        Ok(fetched.into_iter().map(DownloadedUrl::from).collect())
    }

    /// Admit and run one batch
    ///
    /// # Example
    ///
    /// ```no_run
    /// use batch_dl::{BatchDownloader, Config};
    ///
    /// # async fn example() -> batch_dl::Result<()> {
    /// let downloader = BatchDownloader::new(Config::default())?;
    /// let bodies = downloader
    ///     .download(vec!["https://example.com/".to_string()])
    ///     .await?;
    /// println!("{}", bodies[0].result);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn download(&self, urls: Vec<String>) -> Result<Vec<DownloadedUrl>> {
        let admission = self.admit()?;
        self.run_batch(&admission, urls).await
    }

    /// Process-wide admission limiter
    pub fn limiter(&self) -> &Arc<AdmissionLimiter> {
        &self.limiter
    }

    /// Current configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Snapshot of admission and worker state
    pub fn stats(&self) -> DownloaderStats {
        DownloaderStats {
            in_flight: self.limiter.in_flight(),
            max_concurrent_clients: self.limiter.max_concurrent(),
            active_workers: self.orchestrator.active_workers(),
            worker_count: self.orchestrator.worker_count(),
        }
    }
}
