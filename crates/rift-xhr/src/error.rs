//! Error types for the request simulator.

use crate::xhr::ReadyState;

/// Errors raised synchronously by simulator operations.
///
/// A request that matches no rule is not an error: the fallback rule answers it.
#[derive(Debug, thiserror::Error)]
pub enum XhrError {
    /// Operation attempted outside the state that permits it (`INVALID_STATE_ERR`).
    #[error("invalid state: cannot {operation} while request is {state}")]
    InvalidState {
        operation: &'static str,
        state: ReadyState,
    },

    /// Structured response data could not be serialized to text.
    #[error("response data requires JSON serialization, which failed: {0}")]
    SerializationUnavailable(#[source] serde_json::Error),

    /// A declarative predicate carried a regex that does not compile.
    #[error("invalid predicate pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, XhrError>;
