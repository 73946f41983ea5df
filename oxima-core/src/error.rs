//! Error types shared across the Oxima workspace.

use thiserror::Error;

/// Errors surfaced by the term manager and the optimization engine.
///
/// All error messages are carried by value; there is no global error
/// state to query after a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OximaError {
    /// A soft constraint was declared with a non-positive weight.
    #[error("soft constraint weight must be positive, got {0}")]
    BadWeight(String),

    /// A term had the wrong sort for the requested operation.
    #[error("sort mismatch: expected {expected}, found {found}")]
    SortMismatch {
        /// The sort the operation requires.
        expected: String,
        /// The sort that was supplied.
        found: String,
    },

    /// A bound or assignment query referred to an unknown objective.
    #[error("objective index {index} out of bounds ({count} objectives)")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The number of declared objectives.
        count: usize,
    },

    /// The requested operation falls outside the supported fragment.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, OximaError>;
