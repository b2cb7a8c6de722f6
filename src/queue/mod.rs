//! Job queue used between producers and workers.
//!
//! The pool uses a single [`BoundedQueue`]: a crossbeam bounded channel whose
//! capacity provides backpressure. Retiring the queue is a one-way step that
//! lets workers drain what is buffered and then exit.

mod bounded;

pub use bounded::BoundedQueue;
