//! Pool-wide cancellation signal
//!
//! A [`CancellationToken`] is raised once, when the pool begins shutting down.
//! Besides the usual `is_cancelled()` flag it exposes a channel receiver,
//! [`done()`](CancellationToken::done), that becomes ready the moment the token
//! is cancelled. That lets blocked submissions wait on "queue has room" and
//! "pool is shutting down" in a single `crossbeam::select!`.
//!
//! # Example
//!
//! ```rust
//! use rust_worker_pool::{CancellationToken, ShutdownReason};
//! use std::thread;
//!
//! let token = CancellationToken::new();
//! let waiter = token.clone();
//!
//! let handle = thread::spawn(move || {
//!     // Blocks until the token is cancelled
//!     let _ = waiter.done().recv();
//!     waiter.reason()
//! });
//!
//! token.cancel_with_reason(ShutdownReason::Requested);
//! assert_eq!(handle.join().unwrap(), Some(ShutdownReason::Requested));
//! ```

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Why the pool began shutting down
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShutdownReason {
    /// `stop_and_wait` was called
    Requested,
    /// A job failed, panicked, or a worker could not be spawned
    Failed,
    /// A worker found the queue retired and empty
    Drained,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::Requested => write!(f, "stop requested"),
            ShutdownReason::Failed => write!(f, "worker failed"),
            ShutdownReason::Drained => write!(f, "queue drained"),
        }
    }
}

struct CancellationTokenInner {
    cancelled: AtomicBool,
    /// Dropped on cancel, which disconnects `done`
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
    reason: RwLock<Option<ShutdownReason>>,
}

/// A thread-safe, one-shot cancellation signal shared by the pool and its producers
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationTokenInner>,
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Create a new cancellation token (not cancelled)
    pub fn new() -> Self {
        let (trigger, done) = channel::bounded(0);
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
                reason: RwLock::new(None),
            }),
        }
    }

    /// Cancel the token with the given reason.
    ///
    /// Returns `true` if this call cancelled the token, `false` if it was
    /// already cancelled. The first reason is kept.
    pub fn cancel_with_reason(&self, reason: ShutdownReason) -> bool {
        let mut trigger = self.inner.trigger.lock();
        let Some(sender) = trigger.take() else {
            return false;
        };
        *self.inner.reason.write() = Some(reason);
        self.inner.cancelled.store(true, Ordering::Release);
        drop(sender);
        true
    }

    /// Check if the token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Reason the token was cancelled, if it has been
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.inner.reason.read()
    }

    /// Receiver that becomes ready (disconnected) once the token is cancelled.
    ///
    /// Nothing is ever sent on it; use it as a `recv` arm in
    /// `crossbeam::select!`.
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }
}
