use tracing::info;

/// Receives the number of candidates evaluated so far. Observers cannot
/// influence the search.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, iterations: u64);
}

impl<F> ProgressObserver for F
where
    F: Fn(u64) + Send + Sync,
{
    fn on_progress(&self, iterations: u64) {
        self(iterations)
    }
}

/// Logs each observation as an `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_progress(&self, iterations: u64) {
        info!(iterations, "mining progress");
    }
}
