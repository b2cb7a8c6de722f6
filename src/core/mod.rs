//! Core types for the worker pool

pub mod cancellation;
pub mod error;
pub mod state;

pub use cancellation::{CancellationToken, ShutdownReason};
pub use error::{BoxError, PoolError, Result};
pub use state::PoolState;
