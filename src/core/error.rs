//! Error types for the worker pool

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Boxed error returned by a processing function
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the worker pool
///
/// A pool reports at most one of these per lifetime from
/// [`WorkerPool::stop_and_wait`](crate::WorkerPool::stop_and_wait): the first
/// failure observed by any worker.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// `stop_and_wait` was called on a pool that was never started
    #[error("Worker pool '{pool_name}' is not active")]
    NotActive {
        /// Name of the worker pool
        pool_name: String,
    },

    /// The processing function returned an error
    #[error(transparent)]
    Processing(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// The processing function panicked
    #[error("worker panic: {message}")]
    WorkerPanic {
        /// ID of the worker that recovered the panic
        worker_id: usize,
        /// Panic payload rendered as text; payloads other than strings,
        /// `bool`, `char` and primitive numbers render as `"Unknown panic"`
        message: String,
    },

    /// Failed to spawn a worker thread
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Error message
        message: String,
    },

    /// A worker thread terminated abnormally outside job execution
    #[error("Failed to join worker thread #{worker_id}: {message}")]
    JoinError {
        /// ID of the worker that failed to join
        worker_id: usize,
        /// Error message
        message: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },
}

impl PoolError {
    /// Create a not active error
    pub fn not_active(pool_name: impl Into<String>) -> Self {
        PoolError::NotActive {
            pool_name: pool_name.into(),
        }
    }

    /// Wrap an error returned by the processing function
    pub fn processing(error: impl Into<BoxError>) -> Self {
        PoolError::Processing(Arc::from(error.into()))
    }

    /// Create a worker panic error
    pub fn worker_panic(worker_id: usize, message: impl Into<String>) -> Self {
        PoolError::WorkerPanic {
            worker_id,
            message: message.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(worker_id: usize, message: impl Into<String>) -> Self {
        PoolError::SpawnError {
            worker_id,
            message: message.into(),
        }
    }

    /// Create a join error
    pub fn join(worker_id: usize, message: impl Into<String>) -> Self {
        PoolError::JoinError {
            worker_id,
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error came from the processing function
    pub fn is_processing(&self) -> bool {
        matches!(self, PoolError::Processing(_))
    }

    /// Returns true if this error is a recovered panic
    pub fn is_worker_panic(&self) -> bool {
        matches!(self, PoolError::WorkerPanic { .. })
    }

    /// Returns the processing error as a concrete type, if it is one
    ///
    /// ```rust
    /// use rust_worker_pool::PoolError;
    ///
    /// let err = PoolError::processing(std::io::Error::other("disk full"));
    /// let io = err.downcast_ref::<std::io::Error>().unwrap();
    /// assert_eq!(io.to_string(), "disk full");
    /// ```
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            PoolError::Processing(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Write-once slot holding the first error reported by any worker.
#[derive(Debug, Default)]
pub(crate) struct FirstError {
    set: AtomicBool,
    slot: Mutex<Option<PoolError>>,
}

impl FirstError {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores `error` if the slot is empty. Returns false if it was discarded.
    pub(crate) fn record(&self, error: PoolError) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(error);
        self.set.store(true, Ordering::Release);
        true
    }

    pub(crate) fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    pub(crate) fn get(&self) -> Option<PoolError> {
        self.slot.lock().clone()
    }
}
