//! Error taxonomy shared by every kernel.
//!
//! Kernels validate their whole input before the first write, so an `Err`
//! always means the caller's buffers are untouched.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// A row, column, feature or score index fell outside its buffer.
    #[error("{what} index {index} out of range (bound {bound})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        bound: usize,
    },

    /// A materialized nonzero set would exceed its configured capacity.
    #[error("nonzero set capacity {capacity} exceeded")]
    CapacityExceeded { capacity: usize },

    #[error("invalid gold cluster for mention {mention}: {reason}")]
    InvalidClusterDescriptor {
        mention: usize,
        reason: &'static str,
    },

    #[error("shape mismatch for {what}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, KernelError>;

/// Check that a 1-based id lies in `1..=bound` and return it 0-based.
#[inline]
pub(crate) fn zero_based(what: &'static str, id: usize, bound: usize) -> Result<usize> {
    if id == 0 || id > bound {
        return Err(KernelError::IndexOutOfRange { what, index: id, bound });
    }
    Ok(id - 1)
}

/// Check a buffer holds exactly `expected` elements.
#[inline]
pub(crate) fn expect_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(KernelError::ShapeMismatch { what, expected, actual });
    }
    Ok(())
}
