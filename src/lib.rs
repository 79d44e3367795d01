//! # batch-dl
//!
//! Concurrent batch URL downloader with fail-fast semantics and process-wide
//! admission control.
//!
//! A batch is a list of URLs fetched by a fixed pool of workers. The batch
//! succeeds only if every URL returns a 2xx response; the first failure
//! decides the batch, cancels every in-flight fetch, and is reported with the
//! URL that caused it. At most `max_concurrent_clients` batches run at once;
//! excess requests are rejected immediately instead of queued.
//!
//! ## Quick Start
//!
//! ```no_run
//! use batch_dl::{BatchDownloader, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = BatchDownloader::new(Config::default())?;
//!
//!     let results = downloader
//!         .download(vec![
//!             "https://example.com/a".to_string(),
//!             "https://example.com/b".to_string(),
//!         ])
//!         .await?;
//!
//!     for downloaded in results {
//!         println!("{}: {} bytes", downloaded.url, downloaded.result.len());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Process-wide admission control
pub mod admission;
/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Batch downloader (fetch unit, worker pool, orchestrator)
pub mod downloader;
/// Error types
pub mod error;
/// Request, outcome, and response types
pub mod types;

use std::sync::Arc;

// Re-export commonly used types
pub use admission::{AdmissionGuard, AdmissionLimiter};
pub use config::Config;
pub use downloader::{BatchDownloader, BatchOrchestrator, Fetcher, HttpFetcher};
pub use error::{BatchError, Error, FetchError, Result, ToHttpStatus};
pub use types::{BatchRequest, BatchResponse, DownloadedUrl, DownloaderStats, FetchOutcome};

/// Serve the API until a termination signal arrives, then shut down gracefully.
///
/// On the signal the downloader stops admitting batches and cancels the ones
/// in flight, the server drains its connections, and finally the downloader
/// waits (bounded by `api.shutdown_timeout`) for its worker tasks.
///
/// - **Unix:** listens for SIGTERM and SIGINT; a handler that fails to register is skipped.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use batch_dl::{BatchDownloader, Config, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Arc::new(Config::default());
///     let downloader = Arc::new(BatchDownloader::new((*config).clone())?);
///
///     run_with_shutdown(downloader, config).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: Arc<BatchDownloader>, config: Arc<Config>) -> Result<()> {
    let signal_downloader = Arc::clone(&downloader);
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_downloader.begin_shutdown();
    });

    api::start_api_server(Arc::clone(&downloader), config).await?;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments; a stream that failed
    // to register never fires, leaving the other one in charge
    let received = |kind: SignalKind, name: &'static str| async move {
        match signal(kind) {
            Ok(mut stream) => {
                stream.recv().await;
                name
            }
            Err(e) => {
                tracing::warn!(error = %e, signal = name, "Could not register signal handler");
                std::future::pending::<&'static str>().await
            }
        }
    };

    let name = tokio::select! {
        name = received(SignalKind::terminate(), "SIGTERM") => name,
        name = received(SignalKind::interrupt(), "SIGINT") => name,
    };
    tracing::info!(signal = name, "Received termination signal");
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
