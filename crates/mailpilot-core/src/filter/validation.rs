//! Filter validation.

use chrono::NaiveDateTime;

use super::model::FilterConfig;
use crate::error::{Error, Result};

/// Validation error for filter bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Start bound is later than the stop bound.
    StartAfterStop,
    /// Start bound lies in the future.
    StartInFuture,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::StartAfterStop => "Start date is after stop date",
            Self::StartInFuture => "Start date is in the future",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::StartAfterStop | Self::StartInFuture => "start",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of checking filter bounds.
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Check resolved bounds against each other and against `now`.
///
/// # Errors
///
/// Returns every `ValidationError` that applies.
pub fn check_bounds(
    start: Option<NaiveDateTime>,
    stop: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> ValidationResult {
    let mut errors = Vec::new();

    if let Some(start) = start {
        if stop.is_some_and(|stop| start > stop) {
            errors.push(ValidationError::StartAfterStop);
        }
        if start > now {
            errors.push(ValidationError::StartInFuture);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a filter configuration.
///
/// # Errors
///
/// Returns [`Error::Date`] if a bound cannot be parsed, or
/// [`Error::FilterInconsistency`] with all bound problems.
pub fn validate_filter(filter: &FilterConfig, now: NaiveDateTime) -> Result<()> {
    let (start, stop) = filter.bounds()?;
    check_bounds(start, stop, now).map_err(Error::FilterInconsistency)
}
