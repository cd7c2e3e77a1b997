//! Worker pool for parallel salt mining.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use tracing::{debug, warn};

use crate::miner::{MinedSalt, MiningError, MiningRequest, MiningResult};

use super::cpu::{CpuWorker, SearchState, WorkerStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    Running,
    Finished,
}

/// Runs one request across a set of named worker threads.
pub struct WorkerPool {
    num_workers: usize,
    request: MiningRequest,
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<MinedSalt>,
    matches: Vec<MinedSalt>,
    stop_flag: Arc<AtomicBool>,
    state: Arc<SearchState>,
    stats: Arc<WorkerStats>,
    start_time: Instant,
}

impl WorkerPool {
    /// Starts the search. Fails without spawning anything if the target is unsatisfiable.
    pub fn new(num_workers: usize, request: MiningRequest) -> Result<Self, MiningError> {
        Self::with_stop_flag(num_workers, request, Arc::new(AtomicBool::new(false)))
    }

    /// Like [`WorkerPool::new`], sharing an external stop flag (e.g. a Ctrl-C handler's).
    pub fn with_stop_flag(
        num_workers: usize,
        request: MiningRequest,
        stop_flag: Arc<AtomicBool>,
    ) -> Result<Self, MiningError> {
        request.validate()?;

        let num_workers = num_workers.max(1);
        let (result_tx, result_rx) = unbounded();
        let state = Arc::new(SearchState::new());
        let stats = Arc::new(WorkerStats::new());

        debug!(
            workers = num_workers,
            deployer = %request.deployer,
            target = %request.target,
            max_iterations = request.max_iterations,
            "starting parallel search"
        );

        let mut handles = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let worker = CpuWorker::new(
                id,
                request,
                state.clone(),
                result_tx.clone(),
                stop_flag.clone(),
                stats.clone(),
            );
            let spawned = thread::Builder::new()
                .name(format!("hook-miner-worker-{}", id))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!(worker = id, error = %e, "failed to spawn worker thread"),
            }
        }

        // Chunks are claimed dynamically, so any surviving worker covers the whole range.
        if handles.is_empty() {
            warn!("no worker thread could be spawned, searching on the calling thread");
            CpuWorker::new(
                0,
                request,
                state.clone(),
                result_tx.clone(),
                stop_flag.clone(),
                stats.clone(),
            )
            .run();
        }

        drop(result_tx);

        Ok(Self {
            num_workers: handles.len().max(1),
            request,
            handles: Some(handles),
            result_rx,
            matches: Vec::new(),
            stop_flag,
            state,
            stats,
            start_time: Instant::now(),
        })
    }

    /// Waits up to `timeout` for workers to report. `Finished` once every worker has exited.
    pub fn poll(&mut self, timeout: Duration) -> PoolStatus {
        match self.result_rx.recv_timeout(timeout) {
            Ok(found) => {
                self.matches.push(found);
                PoolStatus::Running
            }
            Err(RecvTimeoutError::Timeout) => PoolStatus::Running,
            Err(RecvTimeoutError::Disconnected) => PoolStatus::Finished,
        }
    }

    /// Blocks until the search ends and returns the smallest matching salt.
    pub fn wait(mut self) -> MiningResult {
        self.matches.extend(self.result_rx.iter());
        self.join_workers();
        self.outcome()
    }

    fn outcome(&self) -> MiningResult {
        if self.state.was_cancelled() {
            return Err(MiningError::Cancelled {
                iterations: self.stats.total_salts(),
            });
        }
        match self.matches.iter().min_by_key(|found| found.iterations) {
            Some(found) => Ok(*found),
            None => Err(MiningError::NotFound {
                iterations: self.request.max_iterations,
            }),
        }
    }

    fn join_workers(&mut self) {
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }

    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }
    pub fn request(&self) -> &MiningRequest {
        &self.request
    }
    /// Smallest matching salt found so far.
    pub fn best(&self) -> Option<u64> {
        self.state.best()
    }
    pub fn total_salts(&self) -> u64 {
        self.stats.total_salts()
    }
    pub fn total_matches(&self) -> u64 {
        self.stats.total_matches()
    }
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
    pub fn salts_per_second(&self) -> f64 {
        let t = self.elapsed().as_secs_f64();
        if t > 0.0 {
            self.total_salts() as f64 / t
        } else {
            0.0
        }
    }
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.handles.is_some() {
            self.stop();
        }
        self.join_workers();
    }
}

/// Searches `request` on `num_workers` threads and blocks for the answer.
pub fn mine_parallel(num_workers: usize, request: MiningRequest) -> MiningResult {
    WorkerPool::new(num_workers, request)?.wait()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{keccak256, Address};
    use crate::flags::FlagMask;
    use crate::miner::Miner;
    use crate::worker::CHUNK_SIZE;

    fn request(target: u32, max_iterations: u64) -> MiningRequest {
        MiningRequest::new(
            Address::ZERO,
            keccak256(b"pool"),
            FlagMask::from_bits_retain(target),
            max_iterations,
        )
    }

    #[test]
    fn test_invalid_mask_spawns_nothing() {
        let err = WorkerPool::new(4, request(0x4000, 1_000_000)).err();
        assert_eq!(
            err,
            Some(MiningError::InvalidMask {
                mask: FlagMask::from_bits_retain(0x4000)
            })
        );
    }

    #[test]
    fn test_zero_bound() {
        assert_eq!(
            mine_parallel(3, request(0, 0)),
            Err(MiningError::NotFound { iterations: 0 })
        );
    }

    #[test]
    fn test_agrees_with_sequential() {
        for target in [0x0000, 0x0001, 0x0abc] {
            let req = request(target, 200_000);
            let sequential = Miner::new().mine(&req);
            for workers in [1, 2, 5] {
                assert_eq!(mine_parallel(workers, req), sequential, "target {:#x}", target);
            }
        }
    }

    #[test]
    fn test_preset_stop_flag_cancels() {
        let stop = Arc::new(AtomicBool::new(true));
        let pool = WorkerPool::with_stop_flag(2, request(0x0001, 1_000_000), stop).unwrap();
        assert_eq!(pool.wait(), Err(MiningError::Cancelled { iterations: 0 }));
    }

    #[test]
    fn test_stop_mid_search_never_reports_a_larger_salt() {
        let req = request(0x2aaa, 5_000_000);
        let sequential = Miner::new().mine(&req);

        let mut pool = WorkerPool::new(2, req).unwrap();
        while pool.total_salts() < 2 * CHUNK_SIZE {
            if pool.poll(Duration::from_millis(1)) == PoolStatus::Finished {
                break;
            }
        }
        pool.stop();
        assert!(pool.is_stopped());

        match pool.wait() {
            Err(MiningError::Cancelled { iterations }) => {
                assert!(iterations >= 2 * CHUNK_SIZE);
                assert!(iterations < req.max_iterations);
            }
            other => assert_eq!(other, sequential),
        }
    }

    #[test]
    fn test_best_tracks_the_answer() {
        let req = request(0x0001, 200_000);
        let mut pool = WorkerPool::new(3, req).unwrap();
        while pool.poll(Duration::from_millis(10)) == PoolStatus::Running {}
        let best = pool.best();
        let result = pool.wait();
        assert_eq!(best, result.ok().map(|found| found.index()));
    }

    #[test]
    fn test_poll_until_finished() {
        let mut pool = WorkerPool::new(2, request(0x0001, 5_000)).unwrap();
        while pool.poll(Duration::from_millis(10)) == PoolStatus::Running {}
        assert!(pool.total_salts() <= 5_000);
        let result = pool.wait();
        assert_eq!(result, Miner::new().mine(&request(0x0001, 5_000)));
    }
}
