//! Error types for MeowID construction, parsing and generation.

use thiserror::Error;

/// Errors that can occur while building, parsing or generating a [`MeowId`](super::MeowId).
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeowIdError {
    /// Timestamp component does not fit the 32-bit field.
    #[error("timestamp is out of range (must be within 0 and {max}, got {actual})")]
    TimestampOutOfRange {
        /// Largest accepted value
        max: u64,
        /// Value that was supplied
        actual: i64,
    },

    /// Sequence component does not fit the 12-bit field.
    #[error("sequence count is out of range (must be within 0 and {max}, got {actual})")]
    SequenceOutOfRange {
        /// Largest accepted value
        max: u64,
        /// Value that was supplied
        actual: u64,
    },

    /// Salt component does not fit the 20-bit field.
    #[error("salt is out of range (must be within 0 and {max}, got {actual})")]
    SaltOutOfRange {
        /// Largest accepted value
        max: u64,
        /// Value that was supplied
        actual: u64,
    },

    /// Textual identifier is not in the `TTTTTTTT-SSS-SALT` form.
    #[error("malformed MeowID '{input}': {reason}")]
    Malformed {
        /// The rejected input
        input: String,
        /// What was wrong with it
        reason: &'static str,
    },

    /// More than 4096 identifiers were requested within one second.
    #[error("number of possible MeowIDs per second is exhausted (second {timestamp})")]
    Exhausted {
        /// The second whose sequence space ran out
        timestamp: u32,
    },
}

impl MeowIdError {
    /// Check if this error reports a component outside its bit width.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            MeowIdError::TimestampOutOfRange { .. }
                | MeowIdError::SequenceOutOfRange { .. }
                | MeowIdError::SaltOutOfRange { .. }
        )
    }

    /// Check if this error reports malformed textual input.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, MeowIdError::Malformed { .. })
    }

    /// Check if this error reports an exhausted per-second sequence.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, MeowIdError::Exhausted { .. })
    }
}

impl From<MeowIdError> for crate::Error {
    fn from(err: MeowIdError) -> Self {
        crate::Error::MeowId(err)
    }
}
