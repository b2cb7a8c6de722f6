//! Bounded FIFO job queue that can be retired.

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::RwLock;

/// A bounded FIFO queue shared between producers and workers.
///
/// The queue owns the only long-lived [`Sender`]. Producers borrow a clone
/// for the duration of one submission via [`sender()`](Self::sender);
/// [`retire()`](Self::retire) drops the owned sender, so once every borrowed
/// clone is gone workers drain the remaining jobs and then observe a
/// disconnected channel.
///
/// # Example
///
/// ```rust
/// use rust_worker_pool::queue::BoundedQueue;
///
/// let queue = BoundedQueue::new(2);
/// let sender = queue.sender().unwrap();
/// sender.send(1).unwrap();
/// sender.send(2).unwrap();
/// drop(sender);
///
/// queue.retire();
///
/// let receiver = queue.receiver();
/// assert_eq!(receiver.iter().collect::<Vec<_>>(), vec![1, 2]);
/// ```
pub struct BoundedQueue<T> {
    sender: RwLock<Option<Sender<T>>>,
    receiver: Receiver<T>,
    capacity: usize,
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("retired", &self.is_retired())
            .finish()
    }
}

impl<T> BoundedQueue<T> {
    /// Creates a new bounded queue with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        let (sender, receiver) = channel::bounded(capacity);
        Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            capacity,
        }
    }

    /// Returns a sender for one submission, or `None` once retired.
    ///
    /// The clone keeps the channel connected while it lives, so callers
    /// must drop it before the queue can finish retiring.
    pub fn sender(&self) -> Option<Sender<T>> {
        self.sender.read().clone()
    }

    /// Returns a receiver handle for a worker.
    pub fn receiver(&self) -> Receiver<T> {
        self.receiver.clone()
    }

    /// Drops the queue's own sender. Returns `false` if already retired.
    pub fn retire(&self) -> bool {
        self.sender.write().take().is_some()
    }

    /// Whether [`retire()`](Self::retire) has been called.
    pub fn is_retired(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Returns the maximum capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered jobs (approximate under concurrency).
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no jobs are buffered.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
