//! Worker pool, workers and the shutdown machinery

pub mod config;
mod gate;
mod shutdown;
pub mod worker;
pub mod worker_pool;

pub use config::WorkerPoolConfig;
pub use worker::{WorkerStats, WorkerStatsSnapshot};
pub use worker_pool::{PoolStats, WorkerPool};
