//! Configuration for the worker pool.

use crate::core::{PoolError, Result};

/// Configuration for a [`WorkerPool`](crate::WorkerPool)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of worker threads (0 = number of CPUs)
    pub num_workers: usize,
    /// Queue capacity. Defaults to one slot per worker.
    ///
    /// Larger values only add buffering; they do not change behavior.
    pub queue_capacity: usize,
    /// Thread name prefix, also used as the pool name in errors
    pub thread_name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

impl WorkerPoolConfig {
    /// Create a new configuration with specified number of workers
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        let num_workers = if num_workers == 0 {
            num_cpus::get()
        } else {
            num_workers
        };
        Self {
            num_workers,
            queue_capacity: num_workers,
            thread_name_prefix: "worker".to_string(),
        }
    }

    /// Set queue capacity
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(PoolError::invalid_config(
                "num_workers",
                "Number of workers must be greater than 0",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::invalid_config(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(PoolError::invalid_config(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        Ok(())
    }
}
