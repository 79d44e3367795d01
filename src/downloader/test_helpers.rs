//! Shared test helpers: a scripted in-memory fetcher and downloader builders.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::downloader::BatchDownloader;
use crate::downloader::fetch::Fetcher;
use crate::error::FetchError;

/// How the scripted fetcher answers one URL
#[derive(Clone, Debug)]
enum Script {
    Respond {
        status: u16,
        body: Vec<u8>,
        delay: Duration,
    },
    HangUntilCancelled,
}

/// [`Fetcher`] that answers from a per-URL script and records what happened.
///
/// Unknown URLs answer 404. Every scripted wait is cancellable, so a
/// cancelled batch unblocks its workers the same way the HTTP fetcher does.
#[derive(Debug, Default)]
pub(crate) struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
    cancelled: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn body(self, url: &str, body: &str) -> Self {
        self.body_after(url, body, Duration::ZERO)
    }

    pub(crate) fn body_after(self, url: &str, body: &str, delay: Duration) -> Self {
        self.script(
            url,
            Script::Respond {
                status: 200,
                body: body.as_bytes().to_vec(),
                delay,
            },
        )
    }

    pub(crate) fn status(self, url: &str, status: u16) -> Self {
        self.status_after(url, status, Duration::ZERO)
    }

    pub(crate) fn status_after(self, url: &str, status: u16, delay: Duration) -> Self {
        self.script(
            url,
            Script::Respond {
                status,
                body: format!("error {}", status).into_bytes(),
                delay,
            },
        )
    }

    pub(crate) fn hang(self, url: &str) -> Self {
        self.script(url, Script::HangUntilCancelled)
    }

    fn script(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    /// Fetches started
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fetches that ended because the batch was cancelled
    pub(crate) fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at once
    pub(crate) fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    fn cancelled_error(&self, url: &str) -> FetchError {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        FetchError::Cancelled {
            url: url.to_string(),
        }
    }

    async fn answer(&self, cancel: &CancellationToken, url: &str) -> Result<Vec<u8>, FetchError> {
        let script = self.scripts.get(url).cloned().unwrap_or(Script::Respond {
            status: 404,
            body: Vec::new(),
            delay: Duration::ZERO,
        });

        match script {
            Script::HangUntilCancelled => {
                cancel.cancelled().await;
                Err(self.cancelled_error(url))
            }
            Script::Respond {
                status,
                body,
                delay,
            } => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(self.cancelled_error(url)),
                    _ = tokio::time::sleep(delay) => {}
                }
                if (200..300).contains(&status) {
                    Ok(body)
                } else {
                    Err(FetchError::Status {
                        url: url.to_string(),
                        status,
                        body: Some(String::from_utf8_lossy(&body).into_owned()),
                    })
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, cancel: &CancellationToken, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);

        let result = self.answer(cancel, url).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Config with small limits suited to tests
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.fetch.worker_count = 2;
    config.fetch.max_urls_per_request = 5;
    config.admission.max_concurrent_clients = 2;
    config.api.shutdown_timeout = Duration::from_secs(2);
    config
}

/// Downloader over a scripted fetcher, returning both so tests can inspect the fetcher
pub(crate) fn create_test_downloader(
    config: Config,
    fetcher: ScriptedFetcher,
) -> (Arc<BatchDownloader>, Arc<ScriptedFetcher>) {
    let fetcher = Arc::new(fetcher);
    let downloader = BatchDownloader::with_fetcher(config, fetcher.clone());
    (Arc::new(downloader), fetcher)
}

/// Poll until no worker tasks remain, failing the test after `limit`
pub(crate) async fn wait_for_idle_workers(downloader: &BatchDownloader, limit: Duration) {
    let deadline = tokio::time::Instant::now() + limit;
    while downloader.stats().active_workers > 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "workers still running after {:?}",
            limit
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
