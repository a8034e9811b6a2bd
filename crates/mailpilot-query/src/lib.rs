//! # mailpilot-query
//!
//! Query language for narrowing item collections of a desktop mail client.
//!
//! ## Features
//!
//! - **Day-first date normalization**: human-entered dates such as `10/12/22`,
//!   `12/12/22 23:59` or `2nd march 2025` become [`chrono::NaiveDateTime`]
//! - **Typed restrictions**: one variant per field kind instead of ad-hoc
//!   string concatenation
//! - **Escaped rendering**: values are quoted and pattern characters are
//!   escaped before they reach the mail client
//! - **In-process evaluation**: the same restriction can be checked against
//!   message fields, so test backends agree with the real client
//!
//! ## Example
//!
//! ```
//! use mailpilot_query::{DateFormat, Predicate, Restriction, TextProperty, parse_date};
//!
//! let format = DateFormat::default();
//! let since = parse_date("10/12/22").unwrap();
//!
//! let received = Predicate::new(Restriction::ReceivedOnOrAfter(since), &format);
//! assert_eq!(received.as_str(), "[ReceivedTime] >= '2022-10-12 00:00 AM'");
//!
//! let subject = Predicate::new(
//!     Restriction::contains(TextProperty::Subject, "O'Brien"),
//!     &format,
//! );
//! assert_eq!(
//!     subject.as_str(),
//!     "@SQL=\"urn:schemas:httpmail:subject\" like '%O''Brien%'"
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod date;
mod error;
pub mod restriction;
pub mod serialize;

pub use date::{
    DEFAULT_DATE_FORMAT, DateFormat, DateInput, RelativeDelta, format_datetime, now, parse_date,
    shift,
};
pub use error::{DateError, Result};
pub use restriction::{MessageFields, Predicate, Restriction, TextProperty};
