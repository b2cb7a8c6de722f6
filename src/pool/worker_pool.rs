//! Worker pool implementation

use super::config::WorkerPoolConfig;
use super::gate::FeedOutcome;
use super::shutdown::ShutdownCoordinator;
use super::worker::{Worker, WorkerStats, WorkerStatsSnapshot};
use crate::core::error::FirstError;
use crate::core::state::StateCell;
use crate::core::{BoxError, PoolError, PoolState, Result, ShutdownReason};
use crate::queue::BoundedQueue;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Type-erased processing function shared by all workers
pub(crate) type ProcessFn<T> = dyn Fn(T) -> std::result::Result<(), BoxError> + Send + Sync;

/// State shared between the pool handle and its workers
pub(crate) struct Shared<T> {
    pub(crate) config: WorkerPoolConfig,
    pub(crate) process: Arc<ProcessFn<T>>,
    pub(crate) state: StateCell,
    pub(crate) queue: Arc<BoundedQueue<T>>,
    pub(crate) coordinator: ShutdownCoordinator<T>,
    pub(crate) first_error: FirstError,
    pub(crate) worker_stats: Vec<Arc<WorkerStats>>,
    pub(crate) jobs_submitted: AtomicU64,
    pub(crate) jobs_dropped: AtomicU64,
}

impl<T> Shared<T> {
    pub(crate) fn has_failed(&self) -> bool {
        self.first_error.is_set()
    }

    /// Record a worker failure and shut the pool down.
    ///
    /// Only the first failure is kept; later ones are logged and discarded.
    pub(crate) fn record_failure(&self, err: PoolError) {
        if self.first_error.record(err.clone()) {
            info!(
                "Worker pool '{}' failing fast: {}",
                self.config.thread_name_prefix, err
            );
        } else {
            warn!(
                "Worker pool '{}' discarded secondary error: {}",
                self.config.thread_name_prefix, err
            );
        }
        self.begin_shutdown(ShutdownReason::Failed);
    }

    /// Run the teardown (idempotent) and move to `ShuttingDown`.
    ///
    /// The state changes only after the gate is closed, so observing
    /// `ShuttingDown` guarantees later feeds are dropped.
    pub(crate) fn begin_shutdown(&self, reason: ShutdownReason) {
        if self.coordinator.shutdown(reason) {
            #[cfg(feature = "tracing")]
            crate::telemetry::metrics::record_shutdown(reason);
        }
        self.state.transition(PoolState::Started, PoolState::ShuttingDown);
    }
}

/// Aggregate statistics for a pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Current lifecycle state
    pub state: PoolState,
    /// Configured number of workers
    pub num_workers: usize,
    /// Jobs accepted into the queue
    pub jobs_submitted: u64,
    /// Jobs dropped because the pool was not running
    pub jobs_dropped: u64,
    /// Jobs processed successfully
    pub jobs_processed: u64,
    /// Jobs whose processing function returned an error
    pub jobs_failed: u64,
    /// Jobs whose processing function panicked
    pub jobs_panicked: u64,
}

/// A bounded, fail-fast pool of worker threads
///
/// Jobs of type `T` are fed into a bounded queue and handed to a fixed set
/// of workers, each applying the same processing function. The first error
/// (or panic) from any job stops the whole pool; it is reported by
/// [`stop_and_wait`](Self::stop_and_wait).
///
/// # Lifecycle
///
/// - [`start`](Self::start) spawns the workers, exactly once.
/// - [`feed`](Self::feed) blocks while the queue is full. Jobs fed before
///   `start` or after shutdown has begun are silently dropped.
/// - [`stop_and_wait`](Self::stop_and_wait) stops accepting jobs, lets the
///   workers drain the queue, joins them and returns the first error.
///
/// # Example
///
/// ```rust
/// use rust_worker_pool::prelude::*;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> Result<()> {
/// let processed = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&processed);
///
/// let pool = WorkerPool::new(4, move |_job: u32| -> std::result::Result<(), BoxError> {
///     counter.fetch_add(1, Ordering::Relaxed);
///     Ok(())
/// })?;
///
/// pool.start();
/// for job in 0..100 {
///     pool.feed(job);
/// }
/// pool.stop_and_wait()?;
///
/// assert_eq!(processed.load(Ordering::Relaxed), 100);
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    workers: Mutex<Vec<Worker>>,
}

impl<T: Send + 'static> std::fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let coordinator = &self.shared.coordinator;
        f.debug_struct("WorkerPool")
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .field("queue", &self.shared.queue)
            .field("in_flight", &coordinator.gate().in_flight())
            .field("shutdown", &coordinator.is_shutdown())
            .field("shutdown_reason", &coordinator.token().reason())
            .field("failed", &self.shared.has_failed())
            .finish()
    }
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Create a pool with `num_workers` workers (0 = number of CPUs)
    pub fn new<F, E>(num_workers: usize, process: F) -> Result<Self>
    where
        F: Fn(T) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::with_config(WorkerPoolConfig::new(num_workers), process)
    }

    /// Create a pool with custom configuration
    pub fn with_config<F, E>(config: WorkerPoolConfig, process: F) -> Result<Self>
    where
        F: Fn(T) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        config.validate()?;

        let process_fn: Arc<ProcessFn<T>> =
            Arc::new(move |job: T| -> std::result::Result<(), BoxError> {
                process(job).map_err(Into::into)
            });
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let worker_stats = (0..config.num_workers)
            .map(|_| Arc::new(WorkerStats::new()))
            .collect();

        Ok(Self {
            shared: Arc::new(Shared {
                coordinator: ShutdownCoordinator::new(Arc::clone(&queue)),
                config,
                process: process_fn,
                state: StateCell::new(),
                queue,
                first_error: FirstError::new(),
                worker_stats,
                jobs_submitted: AtomicU64::new(0),
                jobs_dropped: AtomicU64::new(0),
            }),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Start the pool by spawning its workers
    ///
    /// Only the first call has any effect; redundant or concurrent calls
    /// return immediately. A worker thread that cannot be spawned becomes
    /// the pool's first error and shuts the pool down.
    pub fn start(&self) {
        if !self
            .shared
            .state
            .transition(PoolState::Created, PoolState::Started)
        {
            debug!(
                "Worker pool '{}' already started",
                self.shared.config.thread_name_prefix
            );
            return;
        }

        let mut workers = self.workers.lock();
        for (id, stats) in self.shared.worker_stats.iter().enumerate() {
            match Worker::spawn(id, Arc::clone(&self.shared), Arc::clone(stats)) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    error!(
                        "Worker pool '{}' failed to spawn worker {}: {}",
                        self.shared.config.thread_name_prefix, id, e
                    );
                    self.shared.record_failure(PoolError::spawn(id, e.to_string()));
                    break;
                }
            }
        }

        info!(
            "Worker pool '{}' started with {} workers (queue capacity {})",
            self.shared.config.thread_name_prefix,
            workers.len(),
            self.shared.queue.capacity()
        );
        #[cfg(feature = "tracing")]
        crate::telemetry::metrics::record_pool_start(workers.len(), self.shared.queue.capacity());
    }

    /// Submit a job, blocking while the queue is full
    ///
    /// The job is silently dropped if the pool has not been started, or if
    /// shutdown begins before the job could be enqueued.
    pub fn feed(&self, job: T) {
        let outcome = if self.shared.state.load() == PoolState::Created {
            FeedOutcome::Dropped
        } else {
            self.shared.coordinator.gate().feed(job)
        };

        match outcome {
            FeedOutcome::Enqueued => {
                self.shared.jobs_submitted.fetch_add(1, Ordering::Relaxed);
            }
            FeedOutcome::Dropped => {
                self.shared.jobs_dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Worker pool '{}' dropped a job (state: {})",
                    self.shared.config.thread_name_prefix,
                    self.state()
                );
            }
        }
    }

    /// Stop accepting jobs, wait for every worker to exit and return the
    /// first error any of them reported
    ///
    /// Jobs already in the queue are still processed unless a job has
    /// failed. Calling this again returns the same outcome without redoing
    /// any work; concurrent callers all wait for the workers to be joined.
    ///
    /// # Errors
    ///
    /// - `PoolError::NotActive` - the pool was never started
    /// - `PoolError::Processing` - the first error returned by the processing function
    /// - `PoolError::WorkerPanic` - the processing function panicked first
    /// - `PoolError::SpawnError` - a worker thread could not be spawned
    pub fn stop_and_wait(&self) -> Result<()> {
        if self.shared.state.load() == PoolState::Created {
            return Err(PoolError::not_active(
                &self.shared.config.thread_name_prefix,
            ));
        }

        self.shared.begin_shutdown(ShutdownReason::Requested);

        {
            // Held while joining so concurrent callers wait for completion
            let mut workers = self.workers.lock();
            for worker in workers.drain(..) {
                let id = worker.id();
                if let Err(e) = worker.join() {
                    error!("Worker {} terminated abnormally: {}", id, e);
                    self.shared.record_failure(e);
                }
            }
        }

        if self
            .shared
            .state
            .transition(PoolState::ShuttingDown, PoolState::Stopped)
        {
            let stats = self.stats();
            info!(
                "Worker pool '{}' stopped: {} processed, {} failed, {} panicked, {} dropped",
                self.shared.config.thread_name_prefix,
                stats.jobs_processed,
                stats.jobs_failed,
                stats.jobs_panicked,
                stats.jobs_dropped
            );
            #[cfg(feature = "tracing")]
            crate::telemetry::metrics::record_pool_stopped(stats.jobs_processed, stats.jobs_failed);
        }

        match self.shared.first_error.get() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        self.shared.state.load()
    }

    /// Check if the pool is accepting jobs
    pub fn is_running(&self) -> bool {
        self.state() == PoolState::Started && !self.shared.coordinator.gate().is_closed()
    }

    /// Get the number of worker threads
    pub fn num_workers(&self) -> usize {
        self.shared.config.num_workers
    }

    /// Get the queue capacity
    pub fn queue_capacity(&self) -> usize {
        self.shared.queue.capacity()
    }

    /// Get current number of queued jobs (approximate)
    pub fn queued_jobs(&self) -> usize {
        self.shared.queue.len()
    }

    /// Get the pool configuration
    pub fn config(&self) -> &WorkerPoolConfig {
        &self.shared.config
    }

    /// Get statistics for each worker
    pub fn worker_stats(&self) -> Vec<WorkerStatsSnapshot> {
        self.shared
            .worker_stats
            .iter()
            .map(|stats| stats.snapshot())
            .collect()
    }

    /// Get aggregate statistics
    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            state: self.state(),
            num_workers: self.num_workers(),
            jobs_submitted: self.shared.jobs_submitted.load(Ordering::Relaxed),
            jobs_dropped: self.shared.jobs_dropped.load(Ordering::Relaxed),
            jobs_processed: 0,
            jobs_failed: 0,
            jobs_panicked: 0,
        };
        for worker in &self.shared.worker_stats {
            stats.jobs_processed += worker.get_jobs_processed();
            stats.jobs_failed += worker.get_jobs_failed();
            stats.jobs_panicked += worker.get_jobs_panicked();
        }
        stats
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        if matches!(self.state(), PoolState::Started | PoolState::ShuttingDown) {
            if let Err(e) = self.stop_and_wait() {
                error!(
                    "Worker pool '{}' stopped with error during drop: {}",
                    self.shared.config.thread_name_prefix, e
                );
            }
        }
    }
}
