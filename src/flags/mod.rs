//! Hook permission flags encoded in the low bits of a hook's address.
//!
//! Bit layout (bit 13 is the most significant flag):
//! - 13..8: initialize / add liquidity / remove liquidity callbacks
//! - 7..4: swap / donate callbacks
//! - 3..0: callbacks that may return balance deltas

mod mask;

pub use mask::{Flag, FlagMask, FlagParseError, ALL_FLAGS_MASK, FLAG_COUNT};
