//! Worker pool: a fixed number of tasks draining one batch's shared queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::types::{FetchOutcome, FetchedBody};

use super::fetch::Fetcher;

/// Write-once queue of pending URLs for one batch.
///
/// Fully populated before any worker starts and never appended to, so a
/// worker observing an exhausted queue can exit: no more work will arrive.
/// Handing out a URL is a single atomic increment; no lock is needed.
#[derive(Debug)]
pub(crate) struct TaskQueue {
    urls: Vec<String>,
    next: AtomicUsize,
}

impl TaskQueue {
    pub(crate) fn new(urls: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            urls,
            next: AtomicUsize::new(0),
        })
    }

    /// Claim the next pending URL; each position is handed out exactly once
    pub(crate) fn next(&self) -> Option<&str> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.urls.get(index).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.urls.len()
    }
}

/// Parameters for starting a batch's workers
pub(crate) struct WorkerPoolParams {
    /// Workers to start, independent of batch size
    pub(crate) worker_count: usize,
    /// The batch's pending URLs
    pub(crate) queue: Arc<TaskQueue>,
    /// Transport used for every fetch
    pub(crate) fetcher: Arc<dyn Fetcher>,
    /// The batch's cancellation token
    pub(crate) cancel: CancellationToken,
    /// Result channel; capacity must be at least the queue length
    pub(crate) results: mpsc::Sender<FetchOutcome>,
}

/// Start `worker_count` detached workers on `tracker`.
///
/// Each worker pulls URLs until the queue is exhausted and emits one
/// [`FetchOutcome`] per URL. Workers never decide the batch and never drop
/// outcomes themselves; once the receiver is gone they stop sending and exit.
pub(crate) fn spawn_workers(tracker: &TaskTracker, params: WorkerPoolParams) {
    let WorkerPoolParams {
        worker_count,
        queue,
        fetcher,
        cancel,
        results,
    } = params;

    debug_assert!(
        results.max_capacity() >= queue.len(),
        "result channel smaller than batch"
    );

    for worker in 0..worker_count {
        tracker.spawn(run_worker(
            worker,
            Arc::clone(&queue),
            Arc::clone(&fetcher),
            cancel.clone(),
            results.clone(),
        ));
    }
}

async fn run_worker(
    worker: usize,
    queue: Arc<TaskQueue>,
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationToken,
    results: mpsc::Sender<FetchOutcome>,
) -> usize {
    let mut processed = 0;

    while let Some(url) = queue.next() {
        tracing::debug!(worker, url = %url, "Fetching url");

        let outcome: FetchOutcome = fetcher
            .fetch(&cancel, url)
            .await
            .map(|body| FetchedBody {
                url: url.to_string(),
                body,
            })
            .into();

        if let FetchOutcome::Failed(e) = &outcome {
            if e.is_cancelled() {
                tracing::debug!(worker, url = %url, "Fetch cancelled");
            } else {
                tracing::warn!(worker, url = %url, error = %e, "Failed to process url");
            }
        }
        processed += 1;

        // Capacity covers the whole batch, so this only fails once the
        // orchestrator has returned and dropped the receiver
        if results.send(outcome).await.is_err() {
            tracing::debug!(worker, "Batch already decided, worker exiting");
            break;
        }
    }

    tracing::debug!(worker, processed, "Worker finished");
    processed
}
