use crate::flags::FlagMask;

/// Terminal outcomes of a search that did not produce a salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MiningError {
    /// The target sets bits no address can expose. Nothing was searched.
    #[error("target mask {mask:#x} sets bits outside the 14 flag bits")]
    InvalidMask { mask: FlagMask },

    /// Every candidate below the bound was tried.
    #[error("no matching salt among the first {iterations} candidates")]
    NotFound { iterations: u64 },

    /// Stopped through the stop flag before the bound was exhausted.
    #[error("search cancelled after {iterations} candidates")]
    Cancelled { iterations: u64 },
}

impl MiningError {
    /// Candidates evaluated before the search ended.
    pub fn iterations(&self) -> u64 {
        match self {
            MiningError::InvalidMask { .. } => 0,
            MiningError::NotFound { iterations } | MiningError::Cancelled { iterations } => {
                *iterations
            }
        }
    }

    /// A larger bound or a retry may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, MiningError::InvalidMask { .. })
    }
}
