//! One-time, idempotent pool teardown.

use super::gate::SubmissionGate;
use crate::core::{CancellationToken, ShutdownReason};
use crate::queue::BoundedQueue;
use log::debug;
use parking_lot::Once;
use std::sync::Arc;

/// Owns the submission gate and retires the queue exactly once.
///
/// The teardown steps are strictly ordered:
///
/// 1. close the gate so no new submission can register
/// 2. cancel the token, releasing submissions blocked on a full queue
/// 3. wait until no submission is in flight
/// 4. retire the queue
///
/// Step 4 must follow step 3, otherwise a producer could still hold a sender
/// into a queue that workers already consider finished.
pub(crate) struct ShutdownCoordinator<T> {
    once: Once,
    gate: SubmissionGate<T>,
    queue: Arc<BoundedQueue<T>>,
    token: CancellationToken,
}

impl<T> ShutdownCoordinator<T> {
    pub(crate) fn new(queue: Arc<BoundedQueue<T>>) -> Self {
        let token = CancellationToken::new();
        Self {
            once: Once::new(),
            gate: SubmissionGate::new(Arc::clone(&queue), token.clone()),
            queue,
            token,
        }
    }

    pub(crate) fn gate(&self) -> &SubmissionGate<T> {
        &self.gate
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs the teardown if nobody has yet.
    ///
    /// Concurrent callers block until the first one finishes. Returns `true`
    /// only for the call that ran the teardown.
    pub(crate) fn shutdown(&self, reason: ShutdownReason) -> bool {
        let mut ran = false;
        self.once.call_once(|| {
            debug!("shutdown started: {}", reason);
            self.gate.close();
            self.token.cancel_with_reason(reason);
            self.gate.wait_drained();
            self.queue.retire();
            debug!("shutdown complete, {} jobs left to drain", self.queue.len());
            ran = true;
        });
        ran
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.once.state().done()
    }
}
