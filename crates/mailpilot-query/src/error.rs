//! Error types for the query library.

use thiserror::Error;

/// Errors that can occur while normalizing or formatting dates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// Input did not match any supported date layout.
    #[error("Unrecognized date: {0:?}")]
    Unrecognized(String),

    /// Date arithmetic left the representable range.
    #[error("Date out of range: {0}")]
    OutOfRange(String),

    /// Format pattern cannot be used to render restriction dates.
    #[error("Invalid date format {pattern:?}: {reason}")]
    InvalidFormat {
        /// The rejected strftime pattern.
        pattern: String,
        /// Why the pattern was rejected.
        reason: &'static str,
    },
}

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, DateError>;
