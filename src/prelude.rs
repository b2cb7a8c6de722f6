//! Convenient re-exports for common types

pub use crate::core::{BoxError, PoolError, PoolState, Result, ShutdownReason};
pub use crate::pool::{PoolStats, WorkerPool, WorkerPoolConfig, WorkerStatsSnapshot};
