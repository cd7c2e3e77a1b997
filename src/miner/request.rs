use crate::crypto::{Address, InitCodeHash, Salt};
use crate::flags::FlagMask;

use super::MiningError;

/// Bound used when the caller does not pick one. Roughly 61 times the
/// expected number of candidates for a 14-bit mask.
pub const DEFAULT_MAX_ITERATIONS: u64 = 1_000_000;

pub type MiningResult = Result<MinedSalt, MiningError>;

/// Everything a search needs. Salts `0..max_iterations` are candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningRequest {
    pub deployer: Address,
    pub init_code_hash: InitCodeHash,
    pub target: FlagMask,
    pub max_iterations: u64,
}

impl MiningRequest {
    pub fn new(
        deployer: Address,
        init_code_hash: InitCodeHash,
        target: FlagMask,
        max_iterations: u64,
    ) -> Self {
        Self {
            deployer,
            init_code_hash,
            target,
            max_iterations,
        }
    }

    /// Rejects targets no address can satisfy.
    pub fn validate(&self) -> Result<(), MiningError> {
        if self.target.is_valid() {
            Ok(())
        } else {
            Err(MiningError::InvalidMask { mask: self.target })
        }
    }
}

/// A salt whose CREATE2 address exposes exactly the requested flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedSalt {
    pub salt: Salt,
    pub address: Address,
    /// Candidates up to and including the match (salt value + 1).
    pub iterations: u64,
}

impl MinedSalt {
    /// The salt as the counter value it was mined from.
    pub fn index(&self) -> u64 {
        self.iterations.saturating_sub(1)
    }
}
