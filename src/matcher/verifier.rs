//! Flag-mask verification for 20-byte addresses.

use crate::crypto::Address;
use crate::flags::{FlagMask, FLAG_COUNT};

/// True if the address exposes exactly the `target` flags.
///
/// A target with bits outside the flag domain never matches.
#[inline]
pub fn matches(address: &Address, target: FlagMask) -> bool {
    FlagMask::extract(address) == target
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Match,
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// A target mask bound to the match predicate, plus odds for searching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verifier {
    target: FlagMask,
}

impl Verifier {
    pub fn new(target: FlagMask) -> Self {
        Self { target }
    }

    pub fn target(&self) -> FlagMask {
        self.target
    }

    #[inline]
    pub fn check(&self, address: &Address) -> MatchResult {
        if matches(address, self.target) {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Expected candidates per match. All flag bits are compared, so this is
    /// the same for every satisfiable target.
    pub fn expected_iterations(&self) -> u64 {
        if self.target.is_valid() {
            1u64 << FLAG_COUNT
        } else {
            u64::MAX
        }
    }

    /// Probability that at least one of `bound` uniformly hashed candidates matches:
    /// 1 - (1 - 2^-14)^bound.
    pub fn success_probability(&self, bound: u64) -> f64 {
        if !self.target.is_valid() {
            return 0.0;
        }
        let per_trial = 1.0 / self.expected_iterations() as f64;
        1.0 - ((bound as f64) * (-per_trial).ln_1p()).exp()
    }

    pub fn difficulty_description(&self, bound: u64) -> String {
        let p = self.success_probability(bound);
        match p {
            p if p >= 0.999_999 => {
                format!("{:.6}% chance within bound (near certain)", p * 100.0)
            }
            p if p >= 0.9 => format!("{:.4}% chance within bound (likely)", p * 100.0),
            p if p > 0.0 => {
                format!("{:.4}% chance within bound (unlikely, raise the bound)", p * 100.0)
            }
            _ => "no match possible".into(),
        }
    }
}
