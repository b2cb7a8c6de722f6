//! Submission gate: thread-safe entry point for new jobs.
//!
//! Every submission registers itself as in flight before touching the queue
//! and deregisters on every exit path. Shutdown closes the gate, raises the
//! cancellation token and then waits for the in-flight count to reach zero,
//! which proves no producer still holds a sender when the queue is retired.

use crate::core::CancellationToken;
use crate::queue::BoundedQueue;
use crossbeam::select;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::trace;

/// Result of a single submission attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FeedOutcome {
    /// The job is in the queue
    Enqueued,
    /// The gate was closed or cancellation won the race; the job was dropped
    Dropped,
}

#[derive(Debug, Default)]
struct GateState {
    closed: bool,
    in_flight: usize,
}

/// Gate in front of the queue, tracking submissions that are mid-enqueue.
pub(crate) struct SubmissionGate<T> {
    state: Mutex<GateState>,
    drained: Condvar,
    queue: Arc<BoundedQueue<T>>,
    cancel: CancellationToken,
}

/// Registration for one in-flight submission. Released on drop.
pub(crate) struct SubmissionPermit<'a, T> {
    gate: &'a SubmissionGate<T>,
}

impl<T> Drop for SubmissionPermit<'_, T> {
    fn drop(&mut self) {
        let mut state = self.gate.state.lock();
        state.in_flight -= 1;
        if state.in_flight == 0 {
            self.gate.drained.notify_all();
        }
    }
}

impl<T> SubmissionGate<T> {
    pub(crate) fn new(queue: Arc<BoundedQueue<T>>, cancel: CancellationToken) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            drained: Condvar::new(),
            queue,
            cancel,
        }
    }

    /// Registers a submission unless the gate is closed.
    ///
    /// The closed check and the increment happen under one lock, so a
    /// permit can never be handed out after `close()` has returned.
    pub(crate) fn enter(&self) -> Option<SubmissionPermit<'_, T>> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.in_flight += 1;
        Some(SubmissionPermit { gate: self })
    }

    /// Closes the gate. Returns `false` if it was already closed.
    pub(crate) fn close(&self) -> bool {
        let mut state = self.state.lock();
        !std::mem::replace(&mut state.closed, true)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    /// Blocks until no submission is in flight.
    pub(crate) fn wait_drained(&self) {
        let mut state = self.state.lock();
        while state.in_flight > 0 {
            self.drained.wait(&mut state);
        }
    }

    /// Enqueues `job`, blocking while the queue is full, unless the gate is
    /// closed or the cancellation token is raised first.
    pub(crate) fn feed(&self, job: T) -> FeedOutcome {
        let Some(_permit) = self.enter() else {
            return FeedOutcome::Dropped;
        };
        // Declared after the permit so it is dropped before the permit is released
        let Some(sender) = self.queue.sender() else {
            return FeedOutcome::Dropped;
        };

        let outcome = select! {
            send(sender, job) -> res => match res {
                Ok(()) => FeedOutcome::Enqueued,
                Err(_) => FeedOutcome::Dropped,
            },
            recv(self.cancel.done()) -> _ => FeedOutcome::Dropped,
        };

        #[cfg(feature = "tracing")]
        trace!(outcome = ?outcome, queue_depth = self.queue.len(), "feed finished");

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ShutdownReason;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    type GateParts = (
        Arc<SubmissionGate<u32>>,
        Arc<BoundedQueue<u32>>,
        CancellationToken,
    );

    fn new_gate(capacity: usize) -> GateParts {
        let queue = Arc::new(BoundedQueue::new(capacity));
        let token = CancellationToken::new();
        let gate = Arc::new(SubmissionGate::new(Arc::clone(&queue), token.clone()));
        (gate, queue, token)
    }

    #[test]
    fn test_feed_enqueues() {
        let (gate, queue, _token) = new_gate(2);
        assert_eq!(gate.feed(1), FeedOutcome::Enqueued);
        assert_eq!(gate.feed(2), FeedOutcome::Enqueued);
        assert_eq!(queue.len(), 2);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_closed_gate_drops() {
        let (gate, queue, _token) = new_gate(2);
        assert!(gate.close());
        assert!(!gate.close());
        assert!(gate.is_closed());

        assert!(gate.enter().is_none());
        assert_eq!(gate.feed(1), FeedOutcome::Dropped);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_permit_tracks_in_flight() {
        let (gate, _queue, _token) = new_gate(1);
        let first = gate.enter().unwrap();
        let second = gate.enter().unwrap();
        assert_eq!(gate.in_flight(), 2);
        drop(first);
        assert_eq!(gate.in_flight(), 1);
        drop(second);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_cancel_releases_blocked_feed() {
        let (gate, queue, token) = new_gate(1);
        assert_eq!(gate.feed(1), FeedOutcome::Enqueued);

        let blocked = Arc::clone(&gate);
        let handle = thread::spawn(move || blocked.feed(2));

        thread::sleep(Duration::from_millis(20));
        assert_eq!(gate.in_flight(), 1);

        gate.close();
        token.cancel_with_reason(ShutdownReason::Requested);

        assert_eq!(handle.join().unwrap(), FeedOutcome::Dropped);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_wait_drained_blocks_until_permits_released() {
        let (gate, _queue, _token) = new_gate(1);
        let permit = gate.enter().unwrap();
        let finished = Arc::new(AtomicBool::new(false));

        let waiter_gate = Arc::clone(&gate);
        let waiter_done = Arc::clone(&finished);
        let waiter = thread::spawn(move || {
            waiter_gate.wait_drained();
            waiter_done.store(true, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(20));
        assert!(!finished.load(Ordering::SeqCst));

        drop(permit);
        waiter.join().unwrap();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_retired_queue_drops() {
        let (gate, queue, _token) = new_gate(1);
        queue.retire();
        assert_eq!(gate.feed(1), FeedOutcome::Dropped);
        assert_eq!(gate.in_flight(), 0);
    }
}
