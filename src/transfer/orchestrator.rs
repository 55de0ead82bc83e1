//! Upload orchestration
//!
//! Top-level driver for one run: expands the request into units, fans them
//! out over a bounded worker pool, aggregates outcomes and byte-delta
//! progress, and uses each failure's classification to decide between
//! aborting the run and recording it and moving on.
//!
//! Progress deltas are not applied by workers directly; they flow through
//! an mpsc channel into a single aggregator task which owns the rate
//! sampler, so the "time since last sample" baseline has exactly one
//! writer.

use super::units::{enumerate_units, UnitError};
use super::{
    FatalAbort, ProgressState, Summary, TransferError, TransferExecutor, TransferRequest,
};
use crate::classify::Classification;
use crate::client::{ProgressFn, StorageClient};
use crate::failures::{FailureRecord, FailureRecorder};
use crate::perf::PerformanceTracker;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Default width of the worker pool.
pub const DEFAULT_CONCURRENCY: usize = 20;

pub struct UploadOrchestrator {
    client: Arc<dyn StorageClient>,
    recorder: Arc<FailureRecorder>,
    tracker: Arc<PerformanceTracker>,
    concurrency: usize,
}

impl UploadOrchestrator {
    pub fn new(client: Arc<dyn StorageClient>, recorder: Arc<FailureRecorder>) -> Self {
        Self {
            client,
            recorder,
            tracker: Arc::new(PerformanceTracker::new()),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<PerformanceTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Run one transfer request to completion.
    ///
    /// Joins every submitted unit before computing statistics; no outcome
    /// is dropped. A fatal classification stops new units from starting,
    /// lets in-flight ones drain, and surfaces as [`TransferError::Fatal`]
    /// carrying the statistics gathered so far.
    #[tracing::instrument(
        name = "transfer.execute",
        skip(self),
        fields(
            bucket = %request.bucket,
            mode = ?request.mode,
            local_path = %request.local_path.display()
        )
    )]
    pub async fn execute(&self, request: TransferRequest) -> Result<Summary, TransferError> {
        let units = enumerate_units(&request).map_err(|e| match e {
            UnitError::InvalidPath(path) => TransferError::InvalidLocalPath(path),
            UnitError::Io(io) => TransferError::Enumeration(io),
        })?;
        tracing::info!(units = units.len(), "transfer units enumerated");

        self.tracker.start();
        let state = Arc::new(ProgressState::new());

        // Single consumer of byte deltas; owns the rate sampler.
        let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<u64>();
        let aggregator = {
            let tracker = Arc::clone(&self.tracker);
            tokio::spawn(async move {
                while let Some(delta) = delta_rx.recv().await {
                    tracker.sample(delta);
                }
            })
        };

        let executor = Arc::new(TransferExecutor::new(
            Arc::clone(&self.client),
            request.bucket.clone(),
        ));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();

        for unit in units {
            let executor = Arc::clone(&executor);
            let semaphore = Arc::clone(&semaphore);
            let state = Arc::clone(&state);
            let delta_tx = delta_tx.clone();
            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };
                // Units scheduled after a fatal classification never start.
                if state.abort_requested() {
                    return None;
                }
                let progress: ProgressFn = Arc::new(move |delta| {
                    let _ = delta_tx.send(delta);
                });
                let outcome = executor.transfer(unit, progress).await;
                // Raise the abort flag before releasing the permit so no
                // queued unit can start once a fatal outcome is known.
                if outcome.classification.is_some_and(|c| c.fatal) {
                    state.request_abort();
                }
                Some(outcome)
            });
        }
        drop(delta_tx);

        let mut fatal: Option<Classification> = None;
        while let Some(joined) = workers.join_next().await {
            let outcome = match joined {
                Ok(Some(outcome)) => outcome,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "transfer worker panicked");
                    continue;
                }
            };

            if outcome.success {
                state.successful.fetch_add(1, Ordering::Relaxed);
                state
                    .bytes_transferred
                    .fetch_add(outcome.bytes_confirmed, Ordering::Relaxed);
                continue;
            }

            state.failed.fetch_add(1, Ordering::Relaxed);
            self.recorder.record(FailureRecord {
                bucket: request.bucket.clone(),
                key: outcome.unit.key,
                local_path: outcome.unit.local_path,
                file_size: outcome.local_size,
                error_message: outcome.error_message,
            });
            if let Some(classification) = outcome.classification {
                if classification.fatal {
                    fatal.get_or_insert(classification);
                }
            }
        }

        // All workers joined; close out the delta stream before reading
        // final rates.
        aggregator.await.ok();
        let rates = self.tracker.finish();
        self.recorder.flush()?;

        let summary = Summary {
            success_count: state.successful.load(Ordering::Relaxed),
            failure_count: state.failed.load(Ordering::Relaxed),
            total_bytes: state.bytes_transferred.load(Ordering::Relaxed),
            overall_rate_mbps: rates.overall_mbps,
            min_rate_mbps: rates.min_mbps,
            max_rate_mbps: rates.max_mbps,
            elapsed_secs: rates.elapsed_secs,
        };

        tracing::info!(
            successful = summary.success_count,
            failed = summary.failure_count,
            total_bytes = summary.total_bytes,
            overall_rate_mbps = summary.overall_rate_mbps,
            "transfer run complete"
        );

        match fatal {
            Some(classification) => Err(TransferError::Fatal(FatalAbort {
                category: classification.category,
                message: classification
                    .user_message
                    .unwrap_or("transfer aborted")
                    .to_string(),
                summary,
            })),
            None => Ok(summary),
        }
    }
}
