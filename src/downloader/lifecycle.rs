//! Shutdown coordination

use super::BatchDownloader;
use crate::error::Result;

impl BatchDownloader {
    /// Stop accepting batches and abort the ones in flight.
    ///
    /// Idempotent. After this, [`admit`](Self::admit) fails with
    /// `ShuttingDown` and every running batch fails with a cancellation.
    pub fn begin_shutdown(&self) {
        if !self.shutdown_token.is_cancelled() {
            tracing::info!("Stopped accepting new batches, cancelling in-flight fetches");
            self.shutdown_token.cancel();
        }
    }

    /// Whether shutdown has started
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Resolves once shutdown has started
    pub async fn shutdown_requested(&self) {
        self.shutdown_token.cancelled().await;
    }

    /// Gracefully shut down the downloader.
    ///
    /// 1. Stop admitting batches and cancel every in-flight fetch
    /// 2. Wait (bounded by `api.shutdown_timeout`) for all worker tasks to exit
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.begin_shutdown();

        let shutdown_timeout = self.config.api.shutdown_timeout;
        match tokio::time::timeout(shutdown_timeout, self.orchestrator.wait_for_workers()).await {
            Ok(()) => {
                tracing::info!("All batch workers exited");
            }
            Err(_) => {
                tracing::warn!(
                    active_workers = self.orchestrator.active_workers(),
                    "Timeout waiting for batch workers to exit, proceeding with shutdown"
                );
            }
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}
