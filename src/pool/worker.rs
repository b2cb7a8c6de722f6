//! Worker thread implementation

use super::worker_pool::{ProcessFn, Shared};
use crate::core::{PoolError, Result, ShutdownReason};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs processed successfully
    pub jobs_processed: AtomicU64,
    /// Total number of jobs whose processing function returned an error
    pub jobs_failed: AtomicU64,
    /// Total number of jobs whose processing function panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent processing jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatsSnapshot {
    /// Jobs processed successfully
    pub jobs_processed: u64,
    /// Jobs that returned an error
    pub jobs_failed: u64,
    /// Jobs that panicked
    pub jobs_panicked: u64,
    /// Time spent processing jobs (microseconds)
    pub total_processing_time_us: u64,
}

impl WorkerStatsSnapshot {
    /// Average time per job that ran to completion, whatever its outcome
    pub fn average_processing_time_us(&self) -> f64 {
        let jobs = self.jobs_processed + self.jobs_failed + self.jobs_panicked;
        if jobs > 0 {
            self.total_processing_time_us as f64 / jobs as f64
        } else {
            0.0
        }
    }
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs processed counter
    pub fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs failed counter
    pub fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Copy the current counters
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            jobs_processed: self.get_jobs_processed(),
            jobs_failed: self.get_jobs_failed(),
            jobs_panicked: self.get_jobs_panicked(),
            total_processing_time_us: self.total_processing_time_us.load(Ordering::Relaxed),
        }
    }
}

/// A worker thread that drains the pool's queue
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker named `{prefix}-{id}`.
    pub(crate) fn spawn<T: Send + 'static>(
        id: usize,
        shared: Arc<Shared<T>>,
        stats: Arc<WorkerStats>,
    ) -> std::io::Result<Self> {
        let name = format!("{}-{}", shared.config.thread_name_prefix, id);
        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || Self::run(id, shared, stats))?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }

    /// Get worker ID
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Join the worker thread
    pub(crate) fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|payload| PoolError::join(self.id, panic_message(payload.as_ref())))?;
        }
        Ok(())
    }

    /// Main worker loop
    ///
    /// A worker stops pulling jobs once any worker has recorded an error,
    /// but a job it has already dequeued is always processed. Every exit
    /// path triggers pool shutdown.
    fn run<T: Send + 'static>(id: usize, shared: Arc<Shared<T>>, stats: Arc<WorkerStats>) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        debug!("worker {} started", id);
        let receiver = shared.queue.receiver();

        let reason = loop {
            if shared.has_failed() {
                break ShutdownReason::Failed;
            }
            let Ok(job) = receiver.recv() else {
                // Queue retired and empty
                break ShutdownReason::Drained;
            };
            if let Err(err) = Self::execute_job(id, job, shared.process.as_ref(), &stats) {
                shared.record_failure(err);
                break ShutdownReason::Failed;
            }
        };

        debug!(
            "worker {} exiting ({}): {} processed, {} failed, {} panicked",
            id,
            reason,
            stats.get_jobs_processed(),
            stats.get_jobs_failed(),
            stats.get_jobs_panicked()
        );
        shared.begin_shutdown(reason);
    }

    /// Run the processing function on one job, converting panics to errors
    fn execute_job<T>(
        id: usize,
        job: T,
        process: &ProcessFn<T>,
        stats: &WorkerStats,
    ) -> Result<()> {
        let start = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| process(job)));

        let elapsed = start.elapsed();
        stats.add_processing_time(elapsed.as_micros() as u64);

        match outcome {
            Ok(Ok(())) => {
                stats.increment_processed();
                #[cfg(feature = "tracing")]
                crate::telemetry::metrics::record_completion(elapsed, true);
                Ok(())
            }
            Ok(Err(e)) => {
                stats.increment_failed();
                warn!("Worker {}: job failed: {}", id, e);
                #[cfg(feature = "tracing")]
                crate::telemetry::metrics::record_completion(elapsed, false);
                Err(PoolError::processing(e))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                stats.increment_panicked();
                error!("Worker {}: job panicked: {}", id, message);
                #[cfg(feature = "tracing")]
                crate::telemetry::metrics::record_panic(elapsed);
                Err(PoolError::worker_panic(id, message))
            }
        }
    }
}

/// Render a panic payload as text
///
/// Strings, `bool`, `char` and the primitive numeric types are rendered with
/// `Display`; any other payload type becomes `"Unknown panic"`.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    macro_rules! display_payload {
        ($($ty:ty),*) => {
            $(
                if let Some(value) = payload.downcast_ref::<$ty>() {
                    return value.to_string();
                }
            )*
        };
    }

    display_payload!(
        &str, String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
        usize, f32, f64
    );
    "Unknown panic".to_string()
}
