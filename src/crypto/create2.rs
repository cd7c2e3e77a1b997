//! CREATE2 address computation.
//!
//! Matches the EVM's CREATE2 opcode:
//!   address = keccak256(0xff || deployer || salt || keccak256(initCode))[12:32]

use std::fmt;
use std::str::FromStr;

use super::{keccak256, Address, InitCodeHash};

/// Domain-separation byte that distinguishes CREATE2 preimages from RLP-encoded CREATE ones.
pub const CREATE2_PREFIX: u8 = 0xff;

/// A 256-bit CREATE2 salt, stored big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Salt([u8; 32]);

impl Salt {
    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex (no 0x), always 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decimal string, for tooling that takes the salt as a uint256 literal.
    pub fn to_decimal(&self) -> String {
        let Some(start) = self.0.iter().position(|&b| b != 0) else {
            return "0".to_string();
        };

        // Repeated base-256 to base-10 conversion, least significant digit first.
        let mut digits: Vec<u8> = vec![0];
        for &byte in &self.0[start..] {
            let mut carry = byte as u32;
            for d in digits.iter_mut() {
                let val = (*d as u32) * 256 + carry;
                *d = (val % 10) as u8;
                carry = val / 10;
            }
            while carry > 0 {
                digits.push((carry % 10) as u8);
                carry /= 10;
            }
        }
        digits.iter().rev().map(|d| (b'0' + d) as char).collect()
    }

    fn from_decimal(s: &str) -> Result<Self, SaltParseError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SaltParseError::InvalidDigits);
        }
        let mut bytes = [0u8; 32];
        for digit in s.bytes().map(|b| (b - b'0') as u32) {
            // bytes = bytes * 10 + digit
            let mut carry = digit;
            for byte in bytes.iter_mut().rev() {
                let val = (*byte as u32) * 10 + carry;
                *byte = (val & 0xff) as u8;
                carry = val >> 8;
            }
            if carry != 0 {
                return Err(SaltParseError::Overflow);
            }
        }
        Ok(Self(bytes))
    }

    fn from_hex(h: &str) -> Result<Self, SaltParseError> {
        if h.is_empty() {
            return Err(SaltParseError::InvalidDigits);
        }
        if h.len() > 64 {
            return Err(SaltParseError::Overflow);
        }
        let padded = format!("{:0>64}", h);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes).map_err(|_| SaltParseError::InvalidDigits)?;
        Ok(Self(bytes))
    }
}

impl From<u64> for Salt {
    /// Places the counter in the low 8 bytes of the big-endian word.
    fn from(n: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }
}

/// Accepts `0x`-prefixed hex or a plain decimal integer, up to 256 bits.
impl FromStr for Salt {
    type Err = SaltParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("0x") {
            Some(h) => Self::from_hex(h),
            None => Self::from_decimal(s),
        }
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt(0x{})", self.to_hex())
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaltParseError {
    #[error("salt must be decimal digits or 0x-prefixed hex")]
    InvalidDigits,
    #[error("salt does not fit in 256 bits")]
    Overflow,
}

/// Maps a (deployer, salt, init code hash) triple to the address a deployment would land at.
pub trait AddressDeriver {
    fn derive(&self, deployer: &Address, salt: &Salt, init_code_hash: &InitCodeHash) -> Address;
}

/// The CREATE2 scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct Create2;

impl AddressDeriver for Create2 {
    #[inline]
    fn derive(&self, deployer: &Address, salt: &Salt, init_code_hash: &InitCodeHash) -> Address {
        create2_address(deployer, salt, init_code_hash)
    }
}

/// Computes the CREATE2 address.
/// Preimage: 0xff (1) || deployer (20) || salt (32) || init_code_hash (32) = 85 bytes.
/// Address = keccak256(preimage)[12..32].
pub fn create2_address(deployer: &Address, salt: &Salt, init_code_hash: &InitCodeHash) -> Address {
    let mut preimage = [0u8; 85];
    preimage[0] = CREATE2_PREFIX;
    preimage[1..21].copy_from_slice(deployer.as_bytes());
    preimage[21..53].copy_from_slice(salt.as_bytes());
    preimage[53..85].copy_from_slice(init_code_hash);

    let hash = keccak256(&preimage);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::from_bytes(addr)
}
