//! Single-threaded bounded salt search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::crypto::{AddressDeriver, Create2, Salt};
use crate::matcher::Verifier;

use super::{MinedSalt, MiningError, MiningRequest, MiningResult, ProgressObserver};

/// Progress cadence when the caller sets an observer but no cadence.
pub const DEFAULT_REPORT_EVERY: u64 = 100_000;

/// Candidates between stop flag checks.
const CANCEL_CHECK_INTERVAL: u64 = 1000;

/// Tries salts 0, 1, 2, ... and returns the first whose derived address
/// exposes exactly the target flags.
///
/// The smallest matching salt below the bound is always the one returned, so
/// raising the bound never changes an answer already found.
pub struct Miner<D = Create2> {
    deriver: D,
    report_every: u64,
    observer: Option<Box<dyn ProgressObserver>>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl Miner<Create2> {
    pub fn new() -> Self {
        Self::with_deriver(Create2)
    }
}

impl Default for Miner<Create2> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: AddressDeriver> Miner<D> {
    pub fn with_deriver(deriver: D) -> Self {
        Self {
            deriver,
            report_every: DEFAULT_REPORT_EVERY,
            observer: None,
            stop_flag: None,
        }
    }

    /// Notify the observer every `n` candidates. 0 disables notifications.
    pub fn report_every(mut self, n: u64) -> Self {
        self.report_every = n;
        self
    }

    pub fn observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Checked every 1000 candidates; once set the search ends with
    /// [`MiningError::Cancelled`].
    pub fn stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(stop_flag);
        self
    }

    pub fn deriver(&self) -> &D {
        &self.deriver
    }

    pub fn mine(&self, request: &MiningRequest) -> MiningResult {
        request.validate()?;

        debug!(
            deployer = %request.deployer,
            target = %request.target,
            max_iterations = request.max_iterations,
            "starting sequential search"
        );

        let verifier = Verifier::new(request.target);

        for candidate in 0..request.max_iterations {
            if candidate % CANCEL_CHECK_INTERVAL == 0 && self.is_stopped() {
                debug!(iterations = candidate, "search cancelled");
                return Err(MiningError::Cancelled {
                    iterations: candidate,
                });
            }

            let salt = Salt::from(candidate);
            let address = self
                .deriver
                .derive(&request.deployer, &salt, &request.init_code_hash);

            if verifier.check(&address).is_match() {
                debug!(%salt, %address, "found matching salt");
                return Ok(MinedSalt {
                    salt,
                    address,
                    iterations: candidate + 1,
                });
            }

            self.report(candidate + 1);
        }

        debug!(iterations = request.max_iterations, "search exhausted");
        Err(MiningError::NotFound {
            iterations: request.max_iterations,
        })
    }

    #[inline]
    fn report(&self, done: u64) {
        if let Some(observer) = &self.observer {
            if self.report_every != 0 && done % self.report_every == 0 {
                observer.on_progress(done);
            }
        }
    }

    fn is_stopped(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::Mutex;

    use crate::crypto::{keccak256, Address, InitCodeHash};
    use crate::flags::FlagMask;

    /// Encodes the salt counter straight into the address tail, so matches are predictable.
    struct TailDeriver {
        calls: AtomicU64,
    }

    impl TailDeriver {
        fn new() -> Self {
            Self {
                calls: AtomicU64::new(0),
            }
        }
    }

    impl AddressDeriver for TailDeriver {
        fn derive(&self, _: &Address, salt: &Salt, _: &InitCodeHash) -> Address {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let mut bytes = [0u8; 20];
            bytes[18..].copy_from_slice(&salt.as_bytes()[30..]);
            Address::from_bytes(bytes)
        }
    }

    fn request(target: u32, max_iterations: u64) -> MiningRequest {
        MiningRequest::new(
            Address::ZERO,
            keccak256(b"test"),
            FlagMask::from_bits_retain(target),
            max_iterations,
        )
    }

    #[test]
    fn test_first_match_with_predictable_deriver() {
        let miner = Miner::with_deriver(TailDeriver::new());
        let found = miner.mine(&request(0x0123, 10_000)).unwrap();
        assert_eq!(found.salt, Salt::from(0x0123));
        assert_eq!(found.iterations, 0x0124);
        assert_eq!(found.index(), 0x0123);
        assert_eq!(miner.deriver().calls.load(Ordering::Relaxed), 0x0124);
    }

    #[test]
    fn test_exhaustion_counts_every_candidate() {
        let miner = Miner::with_deriver(TailDeriver::new());
        let err = miner.mine(&request(0x0123, 0x0123)).unwrap_err();
        assert_eq!(err, MiningError::NotFound { iterations: 0x0123 });
        assert_eq!(miner.deriver().calls.load(Ordering::Relaxed), 0x0123);
    }

    #[test]
    fn test_invalid_mask_derives_nothing() {
        let miner = Miner::with_deriver(TailDeriver::new());
        let err = miner.mine(&request(0x3fff + 1, u64::MAX)).unwrap_err();
        assert!(matches!(err, MiningError::InvalidMask { .. }));
        assert_eq!(miner.deriver().calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_zero_bound() {
        let miner = Miner::with_deriver(TailDeriver::new());
        let err = miner.mine(&request(0, 0)).unwrap_err();
        assert_eq!(err, MiningError::NotFound { iterations: 0 });
        assert_eq!(miner.deriver().calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_progress_cadence() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let miner = Miner::with_deriver(TailDeriver::new())
            .report_every(100)
            .observer(move |n| sink.lock().unwrap().push(n));

        // 0x3fff is never produced below 0x3fff, so the full bound runs.
        let err = miner.mine(&request(0x3fff, 350)).unwrap_err();
        assert_eq!(err, MiningError::NotFound { iterations: 350 });
        assert_eq!(*seen.lock().unwrap(), vec![100, 200, 300]);
    }

    #[test]
    fn test_progress_disabled() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        let miner = Miner::with_deriver(TailDeriver::new())
            .report_every(0)
            .observer(move |_| {
                sink.fetch_add(1, Ordering::Relaxed);
            });
        let _ = miner.mine(&request(0x3fff, 1000));
        assert_eq!(seen.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_tracing_observer_does_not_change_outcome() {
        let plain = Miner::new().mine(&request(0x0001, 50_000));
        let observed = Miner::new()
            .report_every(1000)
            .observer(crate::miner::TracingObserver)
            .mine(&request(0x0001, 50_000));
        assert_eq!(plain, observed);
    }

    #[test]
    fn test_preset_stop_flag_cancels() {
        let stop = Arc::new(AtomicBool::new(true));
        let miner = Miner::with_deriver(TailDeriver::new()).stop_flag(stop);
        let err = miner.mine(&request(0x0123, 10_000)).unwrap_err();
        assert_eq!(err, MiningError::Cancelled { iterations: 0 });
        assert_ne!(err, MiningError::NotFound { iterations: 0 });
    }

    #[test]
    fn test_stop_flag_mid_search() {
        let stop = Arc::new(AtomicBool::new(false));
        let trigger = stop.clone();
        let miner = Miner::with_deriver(TailDeriver::new())
            .stop_flag(stop)
            .report_every(1500)
            .observer(move |_| trigger.store(true, Ordering::Relaxed));
        // Flag is raised after 1500 candidates and seen at the next check.
        let err = miner.mine(&request(0x3fff, 10_000)).unwrap_err();
        assert_eq!(err, MiningError::Cancelled { iterations: 2000 });
    }
}
