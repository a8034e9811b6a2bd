//! Date normalization and formatting.
//!
//! Mail filters are usually written by hand, so dates arrive in whatever
//! layout the author prefers. [`parse_date`] accepts the common ones and
//! always reads numeric dates **day first** (`10/12/22` is 10 December 2022).
//! [`DateFormat`] renders timestamps back in the layout the mail client
//! expects inside a received-time restriction.

use std::fmt::{self, Write as _};

use chrono::format::{Fixed, Item, StrftimeItems};
use chrono::{DateTime, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{DateError, Result};

/// Default layout for restriction dates: year, day, month, then time.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%d-%m %H:%M %p";

/// Date layouts, tried in order. Two-digit years come before four-digit ones
/// and year-first layouts come last, because `%Y` would happily read `22` as
/// the year 22.
const DATE_LAYOUTS: &[&str] = &[
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%d %B %y",
    "%d %B %Y",
    "%B %d %y",
    "%B %d %Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
];

/// Time layouts appended to each date layout.
const TIME_LAYOUTS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
];

/// Parses a human-entered date into a timestamp.
///
/// Accepts ISO 8601 and RFC 2822/3339 timestamps, numeric dates separated by
/// `/`, `-` or `.`, and dates with month names (`2nd march 2025`,
/// `March 2, 2025`). A time of day may follow in 24-hour or 12-hour form.
/// Dates without a time resolve to midnight. Zoned timestamps are converted
/// to local time.
///
/// # Errors
///
/// Returns [`DateError::Unrecognized`] if the input matches no layout.
pub fn parse_date(input: &str) -> Result<NaiveDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DateError::Unrecognized(input.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }

    let text = normalize(trimmed);
    for date in DATE_LAYOUTS {
        if let Ok(day) = NaiveDate::parse_from_str(&text, date) {
            return Ok(day.and_time(NaiveTime::MIN));
        }
        for time in TIME_LAYOUTS {
            let layout = format!("{date} {time}");
            if let Ok(dt) = NaiveDateTime::parse_from_str(&text, &layout) {
                return Ok(dt);
            }
        }
    }

    Err(DateError::Unrecognized(input.to_string()))
}

/// Strips commas, ordinal suffixes and the filler word "of", and spells
/// 12-hour times out as `H:MM am` so a single layout covers them.
fn normalize(input: &str) -> String {
    let replaced = input.replace(',', " ");
    let mut tokens: Vec<String> = Vec::new();
    for token in replaced
        .split_whitespace()
        .filter(|token| !token.eq_ignore_ascii_case("of"))
        .map(strip_ordinal)
    {
        if let Some((time, meridiem)) = split_meridiem(token) {
            tokens.push(time.to_string());
            tokens.push(meridiem.to_string());
        } else {
            tokens.push(token.to_string());
        }
    }

    // chrono cannot build a time without minutes
    for i in 1..tokens.len() {
        if is_meridiem(&tokens[i]) && is_bare_hour(&tokens[i - 1]) {
            tokens[i - 1].push_str(":00");
        }
    }

    tokens.join(" ")
}

fn is_meridiem(token: &str) -> bool {
    token.eq_ignore_ascii_case("am") || token.eq_ignore_ascii_case("pm")
}

fn is_bare_hour(token: &str) -> bool {
    (1..=2).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_digit())
}

/// `9pm` becomes `("9", "pm")` and `11:30am` becomes `("11:30", "am")`.
fn split_meridiem(token: &str) -> Option<(&str, &str)> {
    if token.len() <= 2 || !token.is_char_boundary(token.len() - 2) {
        return None;
    }
    let (time, suffix) = token.split_at(token.len() - 2);
    let is_time = time.bytes().all(|b| b.is_ascii_digit() || b == b':');
    (is_meridiem(suffix) && is_time).then_some((time, suffix))
}

/// `2nd` becomes `2`; anything else is returned unchanged.
fn strip_ordinal(token: &str) -> &str {
    if token.len() <= 2 || !token.is_char_boundary(token.len() - 2) {
        return token;
    }
    let (digits, suffix) = token.split_at(token.len() - 2);
    let is_suffix = ["st", "nd", "rd", "th"]
        .iter()
        .any(|s| suffix.eq_ignore_ascii_case(s));
    if is_suffix && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits
    } else {
        token
    }
}

/// Returns the current local wall-clock time.
#[must_use]
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A validated strftime pattern for rendering restriction dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateFormat(String);

impl DateFormat {
    /// Creates a date format from a strftime pattern.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::InvalidFormat`] if the pattern contains a single
    /// quote, an unknown specifier, or a time zone specifier (restriction
    /// dates carry no zone).
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();

        if pattern.contains('\'') {
            return Err(DateError::InvalidFormat {
                pattern,
                reason: "single quotes terminate the restriction literal",
            });
        }

        for item in StrftimeItems::new(&pattern) {
            let reason = match item {
                Item::Error => "unknown specifier",
                Item::Fixed(
                    Fixed::TimezoneName
                    | Fixed::TimezoneOffset
                    | Fixed::TimezoneOffsetColon
                    | Fixed::TimezoneOffsetDoubleColon
                    | Fixed::TimezoneOffsetTripleColon
                    | Fixed::TimezoneOffsetColonZ
                    | Fixed::TimezoneOffsetZ
                    | Fixed::RFC2822
                    | Fixed::RFC3339,
                ) => "time zone specifiers are not supported",
                _ => continue,
            };
            return Err(DateError::InvalidFormat { pattern, reason });
        }

        let mut sample = String::new();
        if write!(sample, "{}", NaiveDateTime::default().format(&pattern)).is_err() {
            return Err(DateError::InvalidFormat {
                pattern,
                reason: "pattern cannot render a date without a time zone",
            });
        }

        Ok(Self(pattern))
    }

    /// Returns the strftime pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self(DEFAULT_DATE_FORMAT.to_string())
    }
}

impl TryFrom<String> for DateFormat {
    type Error = DateError;

    fn try_from(pattern: String) -> Result<Self> {
        Self::new(pattern)
    }
}

impl From<DateFormat> for String {
    fn from(format: DateFormat) -> Self {
        format.0
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats a timestamp with a validated pattern.
#[must_use]
pub fn format_datetime(dt: &NaiveDateTime, format: &DateFormat) -> String {
    dt.format(format.as_str()).to_string()
}

/// A calendar-aware offset, applied by [`shift`].
///
/// Positive values move forward in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelativeDelta {
    /// Whole years.
    pub years: i32,
    /// Whole months.
    pub months: i32,
    /// Weeks.
    pub weeks: i64,
    /// Days.
    pub days: i64,
    /// Hours.
    pub hours: i64,
    /// Minutes.
    pub minutes: i64,
    /// Seconds.
    pub seconds: i64,
}

impl RelativeDelta {
    /// Creates an empty delta.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the year offset.
    #[must_use]
    pub const fn years(mut self, years: i32) -> Self {
        self.years = years;
        self
    }

    /// Sets the month offset.
    #[must_use]
    pub const fn months(mut self, months: i32) -> Self {
        self.months = months;
        self
    }

    /// Sets the week offset.
    #[must_use]
    pub const fn weeks(mut self, weeks: i64) -> Self {
        self.weeks = weeks;
        self
    }

    /// Sets the day offset.
    #[must_use]
    pub const fn days(mut self, days: i64) -> Self {
        self.days = days;
        self
    }

    /// Sets the hour offset.
    #[must_use]
    pub const fn hours(mut self, hours: i64) -> Self {
        self.hours = hours;
        self
    }

    /// Sets the minute offset.
    #[must_use]
    pub const fn minutes(mut self, minutes: i64) -> Self {
        self.minutes = minutes;
        self
    }

    /// Sets the second offset.
    #[must_use]
    pub const fn seconds(mut self, seconds: i64) -> Self {
        self.seconds = seconds;
        self
    }

    fn exact_span(&self) -> Option<TimeDelta> {
        [
            TimeDelta::try_weeks(self.weeks),
            TimeDelta::try_days(self.days),
            TimeDelta::try_hours(self.hours),
            TimeDelta::try_minutes(self.minutes),
            TimeDelta::try_seconds(self.seconds),
        ]
        .into_iter()
        .try_fold(TimeDelta::zero(), |acc, part| acc.checked_add(&part?))
    }
}

/// Moves a timestamp by a relative delta.
///
/// Years and months are applied first; when the target month is shorter the
/// day is clamped to its last day (31 January plus one month is 28 or 29
/// February). The remaining units are then added as an exact span.
///
/// # Errors
///
/// Returns [`DateError::OutOfRange`] if the result is not representable.
pub fn shift(dt: NaiveDateTime, delta: &RelativeDelta) -> Result<NaiveDateTime> {
    let out_of_range = || DateError::OutOfRange(format!("{dt} shifted by {delta:?}"));

    let months = i64::from(delta.years) * 12 + i64::from(delta.months);
    let count = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range())?;
    let moved = if months >= 0 {
        dt.checked_add_months(Months::new(count))
    } else {
        dt.checked_sub_months(Months::new(count))
    }
    .ok_or_else(out_of_range)?;

    let span = delta.exact_span().ok_or_else(out_of_range)?;
    moved.checked_add_signed(span).ok_or_else(out_of_range)
}

/// A date bound as written in a filter: free text or an exact timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    /// An exact timestamp.
    At(NaiveDateTime),
    /// Human-entered text, normalized by [`parse_date`].
    Text(String),
}

impl DateInput {
    /// Resolves the bound to a timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if free text cannot be parsed.
    pub fn resolve(&self) -> Result<NaiveDateTime> {
        match self {
            Self::At(dt) => Ok(*dt),
            Self::Text(text) => parse_date(text),
        }
    }
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for DateInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(dt: NaiveDateTime) -> Self {
        Self::At(dt)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(day: NaiveDate) -> Self {
        Self::At(day.and_time(NaiveTime::MIN))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_day_first_short_year() {
        assert_eq!(parse_date("10/12/22").unwrap(), at(2022, 12, 10, 0, 0));
    }

    #[test]
    fn test_parse_day_first_with_time() {
        assert_eq!(parse_date("12/12/22 23:59").unwrap(), at(2022, 12, 12, 23, 59));
        assert_eq!(parse_date("01-02-2023 09:05").unwrap(), at(2023, 2, 1, 9, 5));
        assert_eq!(parse_date("3.4.2021").unwrap(), at(2021, 4, 3, 0, 0));
    }

    #[test]
    fn test_parse_iso() {
        assert_eq!(parse_date("2022-12-10").unwrap(), at(2022, 12, 10, 0, 0));
        assert_eq!(
            parse_date("2022-12-10T08:30:00").unwrap(),
            at(2022, 12, 10, 8, 30)
        );
        assert_eq!(
            parse_date("2022-12-10 08:30").unwrap(),
            at(2022, 12, 10, 8, 30)
        );
    }

    #[test]
    fn test_parse_month_names_and_ordinals() {
        assert_eq!(parse_date("2nd march 2025").unwrap(), at(2025, 3, 2, 0, 0));
        assert_eq!(parse_date("March 2, 2025").unwrap(), at(2025, 3, 2, 0, 0));
        assert_eq!(parse_date("21st of Jan 2024").unwrap(), at(2024, 1, 21, 0, 0));
        assert_eq!(parse_date("5 Nov 23").unwrap(), at(2023, 11, 5, 0, 0));
    }

    #[test]
    fn test_parse_twelve_hour_clock() {
        assert_eq!(
            parse_date("10/12/2022 11:30 PM").unwrap(),
            at(2022, 12, 10, 23, 30)
        );
        assert_eq!(parse_date("10/12/2022 9 am").unwrap(), at(2022, 12, 10, 9, 0));
        assert_eq!(parse_date("10/12/2022 9pm").unwrap(), at(2022, 12, 10, 21, 0));
        assert_eq!(
            parse_date("10/12/2022 11:30am").unwrap(),
            at(2022, 12, 10, 11, 30)
        );
        assert_eq!(parse_date("2nd march 2025 12 AM").unwrap(), at(2025, 3, 2, 0, 0));
    }

    #[test]
    fn test_normalize_spells_out_bare_hours() {
        assert_eq!(normalize("10/12/2022 9 am"), "10/12/2022 9:00 am");
        assert_eq!(normalize("10/12/2022 9PM"), "10/12/2022 9:00 PM");
        assert_eq!(normalize("10/12/2022 11:30 pm"), "10/12/2022 11:30 pm");
        assert_eq!(normalize("5 Nov 23"), "5 Nov 23");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_date(""), Err(DateError::Unrecognized(_))));
        assert!(matches!(parse_date("   "), Err(DateError::Unrecognized(_))));
        assert!(matches!(
            parse_date("next tuesday-ish"),
            Err(DateError::Unrecognized(_))
        ));
        assert!(parse_date("31/02/2022").is_err());
    }

    #[test]
    fn test_strip_ordinal() {
        assert_eq!(strip_ordinal("2nd"), "2");
        assert_eq!(strip_ordinal("23RD"), "23");
        assert_eq!(strip_ordinal("north"), "north");
        assert_eq!(strip_ordinal("st"), "st");
    }

    #[test]
    fn test_default_format_is_year_day_month() {
        let format = DateFormat::default();
        assert_eq!(
            format_datetime(&at(2022, 12, 10, 0, 0), &format),
            "2022-10-12 00:00 AM"
        );
    }

    #[test]
    fn test_date_format_validation() {
        assert!(DateFormat::new("%m/%d/%Y %I:%M %p").is_ok());
        assert!(matches!(
            DateFormat::new("%Y-%m-%d'"),
            Err(DateError::InvalidFormat { .. })
        ));
        assert!(matches!(
            DateFormat::new("%Y-%m-%d %z"),
            Err(DateError::InvalidFormat { .. })
        ));
        assert!(matches!(
            DateFormat::new("%Y-%J"),
            Err(DateError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_date_format_rejects_permissive_offset() {
        assert!(matches!(
            DateFormat::new("%Y-%m-%d %#z"),
            Err(DateError::InvalidFormat { .. })
        ));
        assert!(serde_json::from_str::<DateFormat>("\"%Y-%m-%d %#z\"").is_err());
    }

    #[test]
    fn test_date_format_deserialize_validates() {
        let ok: DateFormat = serde_json::from_str("\"%d/%m/%Y\"").unwrap();
        assert_eq!(ok.as_str(), "%d/%m/%Y");
        assert!(serde_json::from_str::<DateFormat>("\"%d'%m\"").is_err());
    }

    #[test]
    fn test_shift_clamps_month_end() {
        let start = at(2024, 1, 31, 12, 0);
        let next = shift(start, &RelativeDelta::new().months(1)).unwrap();
        assert_eq!(next, at(2024, 2, 29, 12, 0));

        let back = shift(start, &RelativeDelta::new().years(-1).months(-2)).unwrap();
        assert_eq!(back, at(2022, 11, 30, 12, 0));
    }

    #[test]
    fn test_shift_exact_units() {
        let start = at(2024, 3, 1, 0, 0);
        let delta = RelativeDelta::new().weeks(1).days(-1).hours(2).minutes(30);
        assert_eq!(shift(start, &delta).unwrap(), at(2024, 3, 7, 2, 30));
    }

    #[test]
    fn test_shift_out_of_range() {
        let start = at(2024, 3, 1, 0, 0);
        let result = shift(start, &RelativeDelta::new().years(i32::MAX));
        assert!(matches!(result, Err(DateError::OutOfRange(_))));
    }

    #[test]
    fn test_date_input_resolve() {
        let exact: DateInput = at(2022, 1, 1, 0, 0).into();
        assert_eq!(exact.resolve().unwrap(), at(2022, 1, 1, 0, 0));

        let text: DateInput = "10/12/22".into();
        assert_eq!(text.resolve().unwrap(), at(2022, 12, 10, 0, 0));
    }

    #[test]
    fn test_date_input_deserialize() {
        let exact: DateInput = serde_json::from_str("\"2022-12-10T08:00:00\"").unwrap();
        assert_eq!(exact, DateInput::At(at(2022, 12, 10, 8, 0)));

        let text: DateInput = serde_json::from_str("\"10/12/22\"").unwrap();
        assert_eq!(text, DateInput::Text("10/12/22".to_string()));
    }
}
