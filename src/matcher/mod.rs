//! Checks derived addresses against a target flag mask.

mod verifier;

pub use verifier::{matches, MatchResult, Verifier};
