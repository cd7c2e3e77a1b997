//! The canonical flag table and mask operations.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::crypto::Address;

/// Number of flag bits a hook address carries.
pub const FLAG_COUNT: u32 = 14;

/// Union of every flag bit: the only bits of an address that matter for matching.
pub const ALL_FLAGS_MASK: u32 = (1 << FLAG_COUNT) - 1;

/// A single hook callback permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    BeforeInit,
    AfterInit,
    BeforeAddLiq,
    AfterAddLiq,
    BeforeRemoveLiq,
    AfterRemoveLiq,
    BeforeSwap,
    AfterSwap,
    BeforeDonate,
    AfterDonate,
    BeforeSwapDelta,
    AfterSwapDelta,
    AfterAddLiqDelta,
    AfterRemoveLiqDelta,
}

impl Flag {
    /// Every flag, highest bit first.
    pub const ALL: [Flag; FLAG_COUNT as usize] = [
        Flag::BeforeInit,
        Flag::AfterInit,
        Flag::BeforeAddLiq,
        Flag::AfterAddLiq,
        Flag::BeforeRemoveLiq,
        Flag::AfterRemoveLiq,
        Flag::BeforeSwap,
        Flag::AfterSwap,
        Flag::BeforeDonate,
        Flag::AfterDonate,
        Flag::BeforeSwapDelta,
        Flag::AfterSwapDelta,
        Flag::AfterAddLiqDelta,
        Flag::AfterRemoveLiqDelta,
    ];

    /// Bit position within the address.
    pub const fn bit(self) -> u32 {
        match self {
            Flag::BeforeInit => 13,
            Flag::AfterInit => 12,
            Flag::BeforeAddLiq => 11,
            Flag::AfterAddLiq => 10,
            Flag::BeforeRemoveLiq => 9,
            Flag::AfterRemoveLiq => 8,
            Flag::BeforeSwap => 7,
            Flag::AfterSwap => 6,
            Flag::BeforeDonate => 5,
            Flag::AfterDonate => 4,
            Flag::BeforeSwapDelta => 3,
            Flag::AfterSwapDelta => 2,
            Flag::AfterAddLiqDelta => 1,
            Flag::AfterRemoveLiqDelta => 0,
        }
    }

    #[inline]
    pub const fn mask(self) -> u32 {
        1 << self.bit()
    }

    /// Kebab-case name, as accepted on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Flag::BeforeInit => "before-init",
            Flag::AfterInit => "after-init",
            Flag::BeforeAddLiq => "before-add-liq",
            Flag::AfterAddLiq => "after-add-liq",
            Flag::BeforeRemoveLiq => "before-remove-liq",
            Flag::AfterRemoveLiq => "after-remove-liq",
            Flag::BeforeSwap => "before-swap",
            Flag::AfterSwap => "after-swap",
            Flag::BeforeDonate => "before-donate",
            Flag::AfterDonate => "after-donate",
            Flag::BeforeSwapDelta => "before-swap-delta",
            Flag::AfterSwapDelta => "after-swap-delta",
            Flag::AfterAddLiqDelta => "after-add-liq-delta",
            Flag::AfterRemoveLiqDelta => "after-remove-liq-delta",
        }
    }

    /// Constant-style name (`BEFORE_SWAP`).
    pub fn const_name(self) -> String {
        self.name().replace('-', "_").to_uppercase()
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `before-swap`, `BEFORE_SWAP`, and the long forms
/// `before-initialize`, `after-add-liquidity`, `before-swap-returns-delta`, ...
impl FromStr for Flag {
    type Err = FlagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_lowercase()
            .replace('_', "-")
            .replace("initialize", "init")
            .replace("liquidity", "liq")
            .replace("-returns-delta", "-delta");
        Flag::ALL
            .iter()
            .copied()
            .find(|flag| flag.name() == normalized)
            .ok_or_else(|| FlagParseError(format!("unknown flag: {}", s.trim())))
    }
}

/// A set of flags. May hold bits outside [`ALL_FLAGS_MASK`] so that callers can
/// express, and the miner can reject, an unsatisfiable target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagMask(u32);

impl FlagMask {
    pub const EMPTY: FlagMask = FlagMask(0);
    pub const ALL: FlagMask = FlagMask(ALL_FLAGS_MASK);

    /// Keeps every bit, including ones outside the flag domain.
    #[inline]
    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns `None` if any bit outside the flag domain is set.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !ALL_FLAGS_MASK == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 & !ALL_FLAGS_MASK == 0
    }

    /// Bits set outside the flag domain.
    #[inline]
    pub const fn invalid_bits(self) -> u32 {
        self.0 & !ALL_FLAGS_MASK
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The flags an address exposes: its low 14 bits.
    #[inline]
    pub const fn extract(address: &Address) -> Self {
        Self(address.low_u16() as u32 & ALL_FLAGS_MASK)
    }

    #[inline]
    pub const fn contains(self, flag: Flag) -> bool {
        self.0 & flag.mask() != 0
    }

    #[inline]
    pub const fn with(self, flag: Flag) -> Self {
        Self(self.0 | flag.mask())
    }

    /// Set flags, highest bit first.
    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }
}

impl From<Flag> for FlagMask {
    fn from(flag: Flag) -> Self {
        Self(flag.mask())
    }
}

impl BitOr for FlagMask {
    type Output = FlagMask;
    fn bitor(self, rhs: FlagMask) -> FlagMask {
        FlagMask(self.0 | rhs.0)
    }
}

impl BitOr<Flag> for FlagMask {
    type Output = FlagMask;
    fn bitor(self, rhs: Flag) -> FlagMask {
        self.with(rhs)
    }
}

impl BitOr for Flag {
    type Output = FlagMask;
    fn bitor(self, rhs: Flag) -> FlagMask {
        FlagMask::from(self).with(rhs)
    }
}

impl BitOrAssign<Flag> for FlagMask {
    fn bitor_assign(&mut self, rhs: Flag) {
        self.0 |= rhs.mask();
    }
}

impl FromIterator<Flag> for FlagMask {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        iter.into_iter().fold(FlagMask::EMPTY, FlagMask::with)
    }
}

impl<'a> FromIterator<&'a Flag> for FlagMask {
    fn from_iter<I: IntoIterator<Item = &'a Flag>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}

impl fmt::Debug for FlagMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlagMask({:#06x}: {})", self.0, self)
    }
}

impl fmt::LowerHex for FlagMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// `before-swap|after-swap`, `none`, or with stray bits `before-swap|0x4000`.
impl fmt::Display for FlagMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut parts: Vec<String> = self.iter().map(|flag| flag.name().to_string()).collect();
        if self.invalid_bits() != 0 {
            parts.push(format!("{:#x}", self.invalid_bits()));
        }
        f.write_str(&parts.join("|"))
    }
}

/// Comma- or `|`-separated flag names and/or numbers (`0x` hex or decimal),
/// OR-ed together. `none` and the empty string give the empty mask.
impl FromStr for FlagMask {
    type Err = FlagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mask = FlagMask::EMPTY;
        for token in s.split([',', '|']).map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case("none") {
                continue;
            }
            if let Some(h) = token.strip_prefix("0x") {
                let bits = u32::from_str_radix(h, 16)
                    .map_err(|_| FlagParseError(format!("invalid hex mask: {}", token)))?;
                mask = mask | FlagMask(bits);
            } else if token.bytes().all(|b| b.is_ascii_digit()) {
                let bits: u32 = token
                    .parse()
                    .map_err(|_| FlagParseError(format!("invalid mask: {}", token)))?;
                mask = mask | FlagMask(bits);
            } else {
                mask |= token.parse::<Flag>()?;
            }
        }
        Ok(mask)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FlagParseError(pub String);
