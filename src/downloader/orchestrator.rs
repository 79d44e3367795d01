//! Batch orchestration: fan a batch out over the worker pool and decide it fail-fast.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::BatchError;
use crate::types::{FetchOutcome, FetchedBody};

use super::fetch::Fetcher;
use super::pool::{TaskQueue, WorkerPoolParams, spawn_workers};

/// Drives batches end-to-end over a shared transport.
///
/// One orchestrator serves every batch in the process; each [`run`](Self::run)
/// call gets its own queue, result channel, workers, and cancellation token.
/// Workers are spawned on a shared [`TaskTracker`] so workers abandoned by a
/// failed batch remain observable until they exit.
pub struct BatchOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    worker_count: usize,
    workers: TaskTracker,
}

impl BatchOrchestrator {
    /// Create an orchestrator starting `worker_count` workers per batch
    pub fn new(fetcher: Arc<dyn Fetcher>, worker_count: usize) -> Self {
        Self {
            fetcher,
            worker_count: worker_count.max(1),
            workers: TaskTracker::new(),
        }
    }

    /// Workers started per batch
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Run one batch to a decision.
    ///
    /// Returns every fetched body (in completion order) if all URLs succeed,
    /// or the first observed failure. On failure the batch token is cancelled
    /// and this returns immediately without waiting for outstanding workers:
    /// their fetches abort through the token, their outcomes are discarded,
    /// and they exit once the queue is drained.
    ///
    /// The batch token is a child of `parent`, so cancelling `parent` aborts
    /// the batch. Dropping the returned future also cancels the batch.
    pub async fn run(
        &self,
        parent: &CancellationToken,
        urls: Vec<String>,
    ) -> Result<Vec<FetchedBody>, BatchError> {
        let expected = urls.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let batch_token = parent.child_token();
        // Fires on every exit: first failure, completion, or the caller going away
        let _cancel_on_exit = batch_token.clone().drop_guard();

        let (results_tx, mut results_rx) = mpsc::channel(expected);
        spawn_workers(
            &self.workers,
            WorkerPoolParams {
                worker_count: self.worker_count,
                queue: TaskQueue::new(urls),
                fetcher: Arc::clone(&self.fetcher),
                cancel: batch_token,
                results: results_tx,
            },
        );

        tracing::debug!(
            batch_size = expected,
            workers = self.worker_count,
            "Batch started"
        );

        let mut fetched = Vec::with_capacity(expected);
        while fetched.len() < expected {
            match results_rx.recv().await {
                Some(FetchOutcome::Fetched(body)) => fetched.push(body),
                Some(FetchOutcome::Failed(cause)) => {
                    tracing::warn!(
                        url = %cause.url(),
                        error = %cause,
                        completed = fetched.len(),
                        batch_size = expected,
                        "Batch failed, cancelling outstanding fetches"
                    );
                    return Err(cause.into());
                }
                None => {
                    tracing::error!(
                        received = fetched.len(),
                        batch_size = expected,
                        "Workers exited before reporting every url"
                    );
                    return Err(BatchError::Incomplete {
                        received: fetched.len(),
                        expected,
                    });
                }
            }
        }

        tracing::debug!(batch_size = expected, "Batch completed");
        Ok(fetched)
    }

    /// Worker tasks still running, across all batches
    pub fn active_workers(&self) -> usize {
        self.workers.len()
    }

    /// Wait until every worker spawned so far has exited
    pub(crate) async fn wait_for_workers(&self) {
        self.workers.close();
        self.workers.wait().await;
    }
}
