//! # Rust Worker Pool
//!
//! A bounded, fail-fast worker pool: a fixed set of threads drains a shared
//! queue of jobs and applies one caller-supplied processing function to each,
//! until every job is done or any single job fails.
//!
//! ## Features
//!
//! - **Start once**: redundant `start()` calls are no-ops
//! - **Backpressure**: `feed()` blocks while the bounded queue is full
//! - **Fail-fast**: the first error stops the whole pool; later errors are discarded
//! - **Panic recovery**: a panicking job becomes a `worker panic: ...` error
//! - **Race-free shutdown**: the queue is retired only after every in-flight
//!   submission has either enqueued or been cancelled
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(4, |line: String| -> std::result::Result<(), BoxError> {
//!     if line.is_empty() {
//!         return Err("empty line".into());
//!     }
//!     Ok(())
//! })?;
//!
//! pool.start();
//! for i in 0..10 {
//!     pool.feed(format!("line {}", i));
//! }
//! pool.stop_and_wait()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## First Error Wins
//!
//! ```rust
//! use rust_worker_pool::prelude::*;
//!
//! #[derive(Debug, PartialEq, thiserror::Error)]
//! #[error("job {0} rejected")]
//! struct Rejected(u32);
//!
//! let pool = WorkerPool::new(2, |job: u32| {
//!     if job == 3 { Err(Rejected(job)) } else { Ok(()) }
//! }).unwrap();
//!
//! pool.start();
//! for job in 0..10 {
//!     pool.feed(job);
//! }
//!
//! let err = pool.stop_and_wait().unwrap_err();
//! assert_eq!(err.downcast_ref::<Rejected>(), Some(&Rejected(3)));
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use rust_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = WorkerPoolConfig::new(8)
//!     .with_queue_capacity(64)
//!     .with_thread_name_prefix("ingest");
//!
//! let pool = WorkerPool::with_config(config, |_: Vec<u8>| -> std::result::Result<(), BoxError> {
//!     Ok(())
//! })?;
//! pool.start();
//! # pool.stop_and_wait()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
#[cfg(feature = "tracing")]
pub mod telemetry;

pub use crate::core::{BoxError, CancellationToken, PoolError, PoolState, Result, ShutdownReason};
pub use pool::{PoolStats, WorkerPool, WorkerPoolConfig, WorkerStats, WorkerStatsSnapshot};
