//! Error type for recoverable deque failures.

use core::fmt;

/// The error type for checked deque operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeError {
    /// A checked access named an index at or past the end of the deque.
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The number of live elements at the time of the request.
        len: usize,
    },
}

impl fmt::Display for DequeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for deque of length {len}")
            }
        }
    }
}

impl std::error::Error for DequeError {}

/// Result alias defaulting to [`DequeError`].
pub type Result<T, E = DequeError> = core::result::Result<T, E>;
