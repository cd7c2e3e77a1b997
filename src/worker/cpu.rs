//! CPU worker for parallel salt mining.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, trace};

use crate::crypto::{create2_address, Salt};
use crate::matcher::Verifier;
use crate::miner::{MinedSalt, MiningRequest};

/// Candidates per claimed chunk.
pub const CHUNK_SIZE: u64 = 1000;

#[derive(Debug, Default)]
pub struct WorkerStats {
    pub salts_tried: AtomicU64,
    pub matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn total_salts(&self) -> u64 {
        self.salts_tried.load(Ordering::Relaxed)
    }
    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// Coordination shared by every worker of one search.
#[derive(Debug)]
pub struct SearchState {
    /// Next chunk index to hand out.
    next_chunk: AtomicU64,
    /// Smallest matching salt seen so far, `u64::MAX` until the first match.
    best: AtomicU64,
    /// Set when a worker left a claimed chunk below `best` unscanned.
    cancelled: AtomicBool,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            next_chunk: AtomicU64::new(0),
            best: AtomicU64::new(u64::MAX),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn best(&self) -> Option<u64> {
        match self.best.load(Ordering::Acquire) {
            u64::MAX => None,
            salt => Some(salt),
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CpuWorker {
    id: usize,
    request: MiningRequest,
    verifier: Verifier,
    state: Arc<SearchState>,
    result_tx: Sender<MinedSalt>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        request: MiningRequest,
        state: Arc<SearchState>,
        result_tx: Sender<MinedSalt>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            request,
            verifier: Verifier::new(request.target),
            state,
            result_tx,
            stop_flag,
            stats,
        }
    }

    /// Claims chunks until the range is exhausted, every remaining candidate
    /// is above a known match, or the stop flag is raised.
    pub fn run(&self) {
        let bound = self.request.max_iterations;

        loop {
            let chunk = self.state.next_chunk.fetch_add(1, Ordering::Relaxed);
            let start = chunk.saturating_mul(CHUNK_SIZE);
            if start >= bound || start >= self.state.best.load(Ordering::Acquire) {
                break;
            }
            if self.stop_flag.load(Ordering::Relaxed) {
                self.state.cancelled.store(true, Ordering::Release);
                break;
            }

            let end = start.saturating_add(CHUNK_SIZE).min(bound);
            let tried = self.scan(start, end);
            self.stats.salts_tried.fetch_add(tried, Ordering::Relaxed);
        }

        trace!(worker = self.id, "worker finished");
    }

    /// Scans `start..end` in order, stopping at the first match or once the
    /// shared best is below the current candidate. Returns candidates tried.
    fn scan(&self, start: u64, end: u64) -> u64 {
        let mut tried = 0;
        for candidate in start..end {
            if candidate >= self.state.best.load(Ordering::Relaxed) {
                break;
            }

            let salt = Salt::from(candidate);
            let address =
                create2_address(&self.request.deployer, &salt, &self.request.init_code_hash);
            tried += 1;

            if self.verifier.check(&address).is_match() {
                self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
                self.state.best.fetch_min(candidate, Ordering::AcqRel);
                debug!(worker = self.id, %salt, %address, "worker found matching salt");
                let _ = self.result_tx.send(MinedSalt {
                    salt,
                    address,
                    iterations: candidate + 1,
                });
                break;
            }
        }
        tried
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    use crate::crypto::{keccak256, Address};
    use crate::flags::FlagMask;

    fn stopped_worker(state: Arc<SearchState>) -> (CpuWorker, Arc<WorkerStats>) {
        let request = MiningRequest::new(
            Address::ZERO,
            keccak256(b"cpu"),
            FlagMask::from_bits_retain(0x0001),
            100_000,
        );
        let (tx, _rx) = unbounded();
        let stats = Arc::new(WorkerStats::new());
        let worker = CpuWorker::new(
            0,
            request,
            state,
            tx,
            Arc::new(AtomicBool::new(true)),
            stats.clone(),
        );
        (worker, stats)
    }

    #[test]
    fn test_stop_below_best_marks_cancelled() {
        let state = Arc::new(SearchState::new());
        state.next_chunk.store(5, Ordering::Relaxed);
        state.best.store(10 * CHUNK_SIZE, Ordering::Relaxed);

        let (worker, stats) = stopped_worker(state.clone());
        worker.run();
        assert!(state.was_cancelled());
        assert_eq!(stats.total_salts(), 0);
    }

    #[test]
    fn test_stop_above_best_is_not_a_cancellation() {
        let state = Arc::new(SearchState::new());
        state.next_chunk.store(5, Ordering::Relaxed);
        state.best.store(42, Ordering::Relaxed);

        let (worker, stats) = stopped_worker(state.clone());
        worker.run();
        assert!(!state.was_cancelled());
        assert_eq!(state.best(), Some(42));
        assert_eq!(stats.total_salts(), 0);
    }

    #[test]
    fn test_exhausted_range_is_not_a_cancellation() {
        let state = Arc::new(SearchState::new());
        state.next_chunk.store(100, Ordering::Relaxed);

        let (worker, _) = stopped_worker(state.clone());
        worker.run();
        assert!(!state.was_cancelled());
    }
}
