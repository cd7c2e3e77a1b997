//! # hook_miner
//!
//! Hook address miner. Varies the CREATE2 salt until the derived contract
//! address exposes exactly the requested permission flags in its low 14 bits.
//!
//! address = keccak256(0xff || deployer || salt || initCodeHash)[12..32], and a
//! salt matches when `address & 0x3fff == flags`.
//!
//! ## Architecture
//!
//! - `crypto`: Keccak-256, CREATE2 derivation, address and salt types
//! - `flags`: The flag table and mask extraction
//! - `matcher`: Address-against-mask verification
//! - `miner`: Request/result contracts and the sequential search
//! - `worker`: Parallel search over a thread pool
//! - `config`: Command-line configuration

pub mod config;
pub mod crypto;
pub mod flags;
pub mod matcher;
pub mod miner;
pub mod worker;

pub use config::{Config, ConfigError};
pub use crypto::{
    create2_address, init_code_hash, keccak256, Address, AddressDeriver, Create2, InitCodeHash,
    Salt,
};
pub use flags::{Flag, FlagMask, ALL_FLAGS_MASK};
pub use matcher::{matches, MatchResult, Verifier};
pub use miner::{
    MinedSalt, Miner, MiningError, MiningRequest, MiningResult, ProgressObserver, TracingObserver,
    DEFAULT_MAX_ITERATIONS,
};
pub use worker::{mine_parallel, PoolStatus, WorkerPool};
