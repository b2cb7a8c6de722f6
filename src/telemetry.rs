//! Tracing integration for observability.
//!
//! Available with the `tracing` feature. Workers enter a `worker` span for
//! their lifetime, and the functions in [`metrics`] emit structured events
//! that a `tracing` subscriber can turn into counters and histograms.
//!
//! # Example
//!
//! ```rust,ignore
//! use rust_worker_pool::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("rust_worker_pool=trace".parse().unwrap()))
//!     .init();
//!
//! let pool = WorkerPool::new(4, |job: u64| -> std::result::Result<(), BoxError> {
//!     tracing::info!(job, "processing");
//!     Ok(())
//! })?;
//! pool.start();
//! ```

/// Metrics recording functions for observability.
pub mod metrics {
    use crate::core::ShutdownReason;
    use std::time::Duration;

    /// Records job completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;
        if success {
            tracing::trace!(
                counter.jobs_completed = 1,
                histogram.job_duration_ms = duration_ms,
                "job completed successfully"
            );
        } else {
            tracing::trace!(
                counter.jobs_failed = 1,
                histogram.job_duration_ms = duration_ms,
                "job failed"
            );
        }
    }

    /// Records a recovered panic.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize, queue_capacity: usize) {
        tracing::info!(
            workers = num_workers,
            queue_capacity = queue_capacity,
            "worker pool started"
        );
    }

    /// Records the teardown that stopped accepting jobs.
    #[inline]
    pub fn record_shutdown(reason: ShutdownReason) {
        tracing::info!(reason = %reason, "worker pool shutting down");
    }

    /// Records pool stop after all workers were joined.
    #[inline]
    pub fn record_pool_stopped(jobs_processed: u64, jobs_failed: u64) {
        tracing::info!(
            jobs_processed = jobs_processed,
            jobs_failed = jobs_failed,
            "worker pool stopped"
        );
    }
}
