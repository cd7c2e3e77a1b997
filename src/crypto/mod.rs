//! Hashing and CREATE2 address derivation.
//!
//! - init code hash = keccak256(creationCode || constructorArgs)  [32 bytes]
//! - address = keccak256(0xff || deployer || salt || initCodeHash)[12..32]  [85 bytes -> 20 bytes]

mod address;
pub mod create2;

pub use address::Address;
pub use create2::{create2_address, AddressDeriver, Create2, Salt, SaltParseError};

use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 fingerprint of the exact payload being deployed.
pub type InitCodeHash = [u8; 32];

/// Keccak-256 of arbitrary bytes (output 32 bytes).
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(input);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Hashes creation bytecode followed by its ABI-encoded constructor arguments.
pub fn init_code_hash(creation_code: &[u8], constructor_args: &[u8]) -> InitCodeHash {
    let mut hasher = Keccak::v256();
    hasher.update(creation_code);
    hasher.update(constructor_args);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}
