//! Filter configuration.
//!
//! Provides the declarative filter model, its validation, and its
//! translation into ordered restrictions.

mod model;
mod restrictions;
mod validation;

pub use model::FilterConfig;
pub use restrictions::build_restrictions;
pub use validation::{ValidationError, ValidationResult, check_bounds, validate_filter};
