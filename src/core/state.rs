//! Pool lifecycle state

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a [`WorkerPool`](crate::WorkerPool)
///
/// States only move forward:
/// `Created -> Started -> ShuttingDown -> Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PoolState {
    /// Constructed, no workers spawned yet
    Created = 0,
    /// Workers are running and submissions are accepted
    Started = 1,
    /// Shutdown has begun; submissions are dropped
    ShuttingDown = 2,
    /// All workers have been joined
    Stopped = 3,
}

impl PoolState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PoolState::Created,
            1 => PoolState::Started,
            2 => PoolState::ShuttingDown,
            _ => PoolState::Stopped,
        }
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoolState::Created => "created",
            PoolState::Started => "started",
            PoolState::ShuttingDown => "shutting down",
            PoolState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Atomic cell exposing only compare-and-swap transitions.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(PoolState::Created as u8))
    }

    pub(crate) fn load(&self) -> PoolState {
        PoolState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `from -> to`. Returns false if the current state was not `from`.
    pub(crate) fn transition(&self, from: PoolState, to: PoolState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
