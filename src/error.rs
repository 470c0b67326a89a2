//! Error type shared by the codec, planner, engine and dispatcher.

use thiserror::Error;

use crate::engine::TapeId;

/// Errors returned by `adsweep` operations.
///
/// Every error is fail-fast: the operation aborts before writing any result.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AdError {
    /// An argument is out of range or too small for the request
    /// (degree below the partial's total order, bad seed index, wrong buffer shape).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A reused tape or abs-normal problem was recorded with different dimensions.
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Which quantity disagrees (e.g. `"input count"`).
        what: &'static str,
        /// Value cached with the tape.
        expected: usize,
        /// Value supplied by the current call.
        found: usize,
    },

    /// The requested derivative order or mode combination is not supported.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// `reuse_tape` was requested for an id that has never been recorded.
    #[error("no tape recorded under id {0}")]
    UnknownTape(TapeId),
}

impl AdError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AdError::InvalidArgument(msg.into())
    }

    pub(crate) fn mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        AdError::DimensionMismatch {
            what,
            expected,
            found,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdError>;
