//! Error taxonomy for the search core and the pairwise aligner.
//!
//! Every error maps onto one of three kinds so callers can tell
//! "fix your input" from "the machine ran out of memory" from a bug.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad inputs or options; fatal to the call, never retried.
    Validation,
    /// Allocation failure; fatal to the whole search.
    Resource,
    /// Broken internal state.
    Internal,
}

#[derive(Debug, Error)]
pub enum BlastError {
    #[error("bad parameter: {0}")]
    BadParameter(String),

    #[error("sequence {sequence} has symbol '{symbol}' at position {position} outside the scoring alphabet")]
    InvalidCharacter {
        sequence: String,
        symbol: char,
        position: usize,
    },

    #[error("alignment matrix of {rows} x {cols} cells exceeds the limit of {limit} cells")]
    MemoryLimit { rows: usize, cols: usize, limit: u64 },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("allocation failed: {0}")]
    Resource(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BlastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BlastError::BadParameter(_)
            | BlastError::InvalidCharacter { .. }
            | BlastError::MemoryLimit { .. }
            | BlastError::Configuration(_) => ErrorKind::Validation,
            BlastError::Resource(_) => ErrorKind::Resource,
            BlastError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_fatal_to_search(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Validation)
    }
}

pub type BlastResult<T> = Result<T, BlastError>;

/// Allocate a vector of `len` copies of `value`, reporting allocation
/// failure instead of aborting.
pub fn try_filled_vec<T: Clone>(len: usize, value: T, what: &str) -> BlastResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| BlastError::Resource(format!("{what} ({len} elements): {e}")))?;
    v.resize(len, value);
    Ok(v)
}
