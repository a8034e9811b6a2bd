//! Filter model types.

use chrono::NaiveDateTime;
use mailpilot_query::DateInput;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Declarative filter over a folder's messages.
///
/// Every key is optional and an absent key places no constraint. Text keys
/// match as case-insensitive substrings. `has_attachment: false` is the same
/// as leaving the key out.
///
/// ```
/// use mailpilot_core::FilterConfig;
///
/// let filter: FilterConfig = serde_json::from_str(
///     r#"{ "start": "10/12/22", "stop": "12/12/22 23:59", "from_email": "moore@hotmail" }"#,
/// )
/// .unwrap();
/// assert_eq!(filter.from_email.as_deref(), Some("moore@hotmail"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Earliest receive time, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateInput>,
    /// Latest receive time, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<DateInput>,
    /// Text in the sender email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_email: Option<String>,
    /// Text in the sender display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    /// Text in the carbon-copy line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_email: Option<String>,
    /// Text in the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Text in the plain-text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Text in the HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    /// Only messages with attachments when `true`.
    #[serde(alias = "has_attachments", skip_serializing_if = "Option::is_none")]
    pub has_attachment: Option<bool>,
}

impl FilterConfig {
    /// Creates a filter with no constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the earliest receive time.
    #[must_use]
    pub fn start(mut self, start: impl Into<DateInput>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Sets the latest receive time.
    #[must_use]
    pub fn stop(mut self, stop: impl Into<DateInput>) -> Self {
        self.stop = Some(stop.into());
        self
    }

    /// Requires the sender address to contain `text`.
    #[must_use]
    pub fn from_email(mut self, text: impl Into<String>) -> Self {
        self.from_email = Some(text.into());
        self
    }

    /// Requires the sender name to contain `text`.
    #[must_use]
    pub fn from_name(mut self, text: impl Into<String>) -> Self {
        self.from_name = Some(text.into());
        self
    }

    /// Requires the carbon-copy line to contain `text`.
    #[must_use]
    pub fn cc_email(mut self, text: impl Into<String>) -> Self {
        self.cc_email = Some(text.into());
        self
    }

    /// Requires the subject to contain `text`.
    #[must_use]
    pub fn subject(mut self, text: impl Into<String>) -> Self {
        self.subject = Some(text.into());
        self
    }

    /// Requires the plain-text body to contain `text`.
    #[must_use]
    pub fn body(mut self, text: impl Into<String>) -> Self {
        self.body = Some(text.into());
        self
    }

    /// Requires the HTML body to contain `text`.
    #[must_use]
    pub fn html_body(mut self, text: impl Into<String>) -> Self {
        self.html_body = Some(text.into());
        self
    }

    /// Sets the attachment requirement.
    #[must_use]
    pub const fn has_attachment(mut self, required: bool) -> Self {
        self.has_attachment = Some(required);
        self
    }

    /// Returns `true` if no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Resolves the start and stop bounds to timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Date`](crate::Error::Date) if a bound cannot be
    /// parsed.
    pub fn bounds(&self) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>)> {
        let start = self.start.as_ref().map(DateInput::resolve).transpose()?;
        let stop = self.stop.as_ref().map(DateInput::resolve).transpose()?;
        Ok((start, stop))
    }
}
