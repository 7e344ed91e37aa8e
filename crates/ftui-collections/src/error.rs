#![forbid(unsafe_code)]

//! Error type shared by every fallible collection operation.
//!
//! All errors are reported synchronously to the caller of the offending
//! operation. A failed operation never leaves a partial mutation behind: the
//! argument and reentrancy checks run before any element is touched.

use std::fmt;

/// Result alias for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Errors from [`ObservableVec`](crate::ObservableVec) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// A required input was absent (not merely empty).
    InvalidArgument {
        /// Name of the missing argument.
        name: &'static str,
    },
    /// `index` (or the span `index..index + count`) falls outside the
    /// collection, whose length was `len` when the call was made.
    IndexOutOfRange {
        index: usize,
        count: usize,
        len: usize,
    },
    /// A mutation was attempted while a change notification was being
    /// dispatched to more than one listener.
    ReentrancyViolation {
        /// Dispatch depth at the time of the rejected call.
        depth: usize,
        /// Live change listeners at the time of the rejected call.
        listeners: usize,
    },
}

impl CollectionError {
    pub(crate) fn out_of_range(index: usize, count: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, count, len }
    }

    /// Whether this error came from the reentrancy guard.
    #[must_use]
    pub fn is_reentrancy(&self) -> bool {
        matches!(self, Self::ReentrancyViolation { .. })
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { name } => write!(f, "argument '{name}' is absent"),
            Self::IndexOutOfRange { index, count, len } if *count <= 1 => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::IndexOutOfRange { index, count, len } => write!(
                f,
                "range {index}..{} out of range for length {len}",
                index.saturating_add(*count)
            ),
            Self::ReentrancyViolation { depth, listeners } => write!(
                f,
                "reentrant collection change during dispatch (depth {depth}, {listeners} listeners)"
            ),
        }
    }
}

impl std::error::Error for CollectionError {}
