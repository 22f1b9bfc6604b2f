//! Fetch worker pool
//!
//! A single producer hands item indices to a fixed set of workers through a
//! bounded job queue. Each worker calls the metadata source and forwards
//! successful items to the results channel. Failed fetches are logged and
//! dropped; the aggregator fills the gap with an empty item.
//!
//! # Architecture
//! - Job queue: `mpsc::channel(job_buffer)` shared by all workers behind a
//!   mutex. With the default buffer of 1 the producer runs at most one job
//!   ahead of the workers.
//! - Results: every worker owns a clone of the results sender; the stream
//!   closes once the last worker exits.
//! - Cancellation stops job distribution. Jobs already handed out finish.

use crate::error::{FetchError, RankerError, Result};
use crate::models::{Attributes, CollectionSpec, Item};
use crate::services::metadata_source::MetadataSource;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Worker pool configuration
#[derive(Debug, Clone)]
pub struct FetchPoolConfig {
    /// Number of concurrent workers (W)
    pub workers: usize,
    /// Upper bound on a single fetch
    pub fetch_timeout: Duration,
    /// Job queue capacity (tokio channels need at least 1)
    pub job_buffer: usize,
}

impl Default for FetchPoolConfig {
    fn default() -> Self {
        Self {
            workers: rarity_common::config::DEFAULT_WORKERS,
            fetch_timeout: Duration::from_secs(rarity_common::config::DEFAULT_FETCH_TIMEOUT_SECS),
            job_buffer: 1,
        }
    }
}

impl FetchPoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RankerError::Config(
                "Worker count must be a positive integer".to_string(),
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(RankerError::Config(
                "Fetch timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Side-effect notifications from workers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// Item fetched and forwarded to the aggregator
    Fetched { worker_id: usize, index: usize },
    /// Item fetch failed; it will be scored with no attributes
    Failed {
        worker_id: usize,
        index: usize,
        message: String,
    },
}

/// Outcome counts for one pool run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchSummary {
    /// Collection size
    pub requested: usize,
    /// Jobs handed to workers
    pub dispatched: usize,
    /// Items forwarded to the results channel
    pub fetched: usize,
    /// Dispatched jobs that failed
    pub failed: usize,
    /// Distribution stopped early by cancellation
    pub cancelled: bool,
}

impl FetchSummary {
    /// Indices never handed to a worker
    pub fn skipped(&self) -> usize {
        self.requested - self.dispatched
    }
}

#[derive(Default)]
struct Counters {
    fetched: AtomicUsize,
    failed: AtomicUsize,
}

/// Fixed-size pool of fetch workers
pub struct FetchPool {
    config: FetchPoolConfig,
    source: Arc<dyn MetadataSource>,
    event_tx: Option<mpsc::Sender<FetchEvent>>,
}

impl FetchPool {
    pub fn new(config: FetchPoolConfig, source: Arc<dyn MetadataSource>) -> Self {
        Self {
            config,
            source,
            event_tx: None,
        }
    }

    /// Create pool with an event sink for worker notifications
    pub fn with_events(
        config: FetchPoolConfig,
        source: Arc<dyn MetadataSource>,
        event_tx: mpsc::Sender<FetchEvent>,
    ) -> Self {
        Self {
            config,
            source,
            event_tx: Some(event_tx),
        }
    }

    /// Fetch every index in `0..spec.count()` and stream items to `results`
    ///
    /// Returns once all workers have exited, at which point `results` is
    /// closed from this side.
    pub async fn run(
        &self,
        spec: &CollectionSpec,
        results: mpsc::Sender<Item>,
        cancel: CancellationToken,
    ) -> Result<FetchSummary> {
        self.config.validate()?;

        let (job_tx, job_rx) = mpsc::channel::<usize>(self.config.job_buffer.max(1));
        let job_rx = Arc::new(Mutex::new(job_rx));
        let counters = Arc::new(Counters::default());
        let location: Arc<str> = Arc::from(spec.source_location());

        info!(
            workers = self.config.workers,
            count = spec.count(),
            location = %location,
            "Starting fetch workers"
        );

        let handles: Vec<_> = (0..self.config.workers)
            .map(|worker_id| {
                let worker = Worker {
                    worker_id,
                    source: Arc::clone(&self.source),
                    location: Arc::clone(&location),
                    jobs: Arc::clone(&job_rx),
                    results: results.clone(),
                    fetch_timeout: self.config.fetch_timeout,
                    event_tx: self.event_tx.clone(),
                    counters: Arc::clone(&counters),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        // Workers hold the only remaining senders
        drop(results);

        let mut dispatched = 0;
        let mut cancelled = false;
        for index in 0..spec.count() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    info!(dispatched, remaining = spec.count() - dispatched, "Job distribution cancelled");
                    break;
                }
                sent = job_tx.send(index) => {
                    if sent.is_err() {
                        warn!(index, "All workers exited before distribution finished");
                        break;
                    }
                    dispatched += 1;
                }
            }
        }
        drop(job_tx);

        for joined in futures::future::join_all(handles).await {
            joined.map_err(|e| RankerError::Join(e.to_string()))?;
        }

        let summary = FetchSummary {
            requested: spec.count(),
            dispatched,
            fetched: counters.fetched.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            cancelled,
        };

        info!(
            dispatched = summary.dispatched,
            fetched = summary.fetched,
            failed = summary.failed,
            skipped = summary.skipped(),
            "Fetch workers finished"
        );

        Ok(summary)
    }
}

struct Worker {
    worker_id: usize,
    source: Arc<dyn MetadataSource>,
    location: Arc<str>,
    jobs: Arc<Mutex<mpsc::Receiver<usize>>>,
    results: mpsc::Sender<Item>,
    fetch_timeout: Duration,
    event_tx: Option<mpsc::Sender<FetchEvent>>,
    counters: Arc<Counters>,
}

impl Worker {
    async fn run(self) {
        loop {
            let next = self.jobs.lock().await.recv().await;
            let Some(index) = next else {
                break;
            };

            match self.fetch(index).await {
                Ok(attributes) => {
                    info!(worker_id = self.worker_id, index, "Fetched item");
                    self.counters.fetched.fetch_add(1, Ordering::Relaxed);
                    self.emit(FetchEvent::Fetched {
                        worker_id: self.worker_id,
                        index,
                    });

                    if self.results.send(Item::new(index, attributes)).await.is_err() {
                        warn!(worker_id = self.worker_id, "Results stream closed, worker stopping");
                        break;
                    }
                }
                Err(e) => {
                    warn!(
                        worker_id = self.worker_id,
                        index,
                        error = %e,
                        "Fetch failed, item will be scored without attributes"
                    );
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    self.emit(FetchEvent::Failed {
                        worker_id: self.worker_id,
                        index,
                        message: e.to_string(),
                    });
                }
            }
        }

        debug!(worker_id = self.worker_id, "Worker exiting");
    }

    async fn fetch(&self, index: usize) -> std::result::Result<Attributes, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch(&self.location, index)).await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        }
    }

    /// Fire-and-forget; a full or closed sink never stalls fetching
    fn emit(&self, event: FetchEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.try_send(event);
        }
    }
}

/// Progress counts observed by [`log_progress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchProgress {
    pub fetched: usize,
    pub failed: usize,
}

/// Drain worker events, logging progress roughly every tenth of `total`
///
/// Returns when every event sender has been dropped.
pub async fn log_progress(mut events: mpsc::Receiver<FetchEvent>, total: usize) -> FetchProgress {
    let step = (total / 10).max(1);
    let mut progress = FetchProgress::default();

    while let Some(event) = events.recv().await {
        match event {
            FetchEvent::Fetched { .. } => progress.fetched += 1,
            FetchEvent::Failed { .. } => progress.failed += 1,
        }

        let done = progress.fetched + progress.failed;
        if done % step == 0 || done == total {
            info!(
                progress = format!("{}/{}", done, total),
                failed = progress.failed,
                "Fetch progress update"
            );
        }
    }

    progress
}
