//! Parallel salt search.
//!
//! Workers claim fixed-size chunks of the salt range in ascending order and
//! publish matches through a shared minimum, so the pool returns the same
//! salt as the sequential [`Miner`](crate::miner::Miner).

mod cpu;
mod pool;

pub use cpu::{CpuWorker, SearchState, WorkerStats, CHUNK_SIZE};
pub use pool::{mine_parallel, PoolStatus, WorkerPool};
