//! Sequential salt search and the request/result contracts shared with the worker pool.

mod error;
mod progress;
mod request;
mod sequential;

pub use error::MiningError;
pub use progress::{ProgressObserver, TracingObserver};
pub use request::{MinedSalt, MiningRequest, MiningResult, DEFAULT_MAX_ITERATIONS};
pub use sequential::{Miner, DEFAULT_REPORT_EVERY};
