//! Typed restrictions on a mail item collection.

use std::fmt;

use chrono::NaiveDateTime;

use crate::date::DateFormat;
use crate::serialize::write_restriction;

/// A text property that can be searched with a substring match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextProperty {
    /// Sender email address.
    FromEmail,
    /// Sender display name.
    FromName,
    /// Carbon-copy recipients.
    Cc,
    /// Subject line.
    Subject,
    /// Plain-text body.
    TextBody,
    /// HTML body.
    HtmlBody,
}

impl TextProperty {
    /// Returns the namespaced property name understood by the mail client.
    #[must_use]
    pub const fn schema_name(&self) -> &'static str {
        match self {
            Self::FromEmail => "urn:schemas:httpmail:fromemail",
            Self::FromName => "urn:schemas:httpmail:fromname",
            Self::Cc => "urn:schemas:httpmail:cc",
            Self::Subject => "urn:schemas:httpmail:subject",
            Self::TextBody => "urn:schemas:httpmail:textdescription",
            Self::HtmlBody => "urn:schemas:httpmail:htmldescription",
        }
    }
}

/// Schema name of the attachment flag.
pub const HAS_ATTACHMENT_PROPERTY: &str = "urn:schemas:httpmail:hasattachment";

/// A single restriction. Restrictions applied in sequence combine with AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    /// Received at or after the timestamp.
    ReceivedOnOrAfter(NaiveDateTime),
    /// Received at or before the timestamp.
    ReceivedOnOrBefore(NaiveDateTime),
    /// Property contains the text (case-insensitive).
    Contains {
        /// Property to search.
        property: TextProperty,
        /// Literal text to find.
        needle: String,
    },
    /// Message has at least one attachment.
    HasAttachment,
}

impl Restriction {
    /// Creates a substring restriction.
    #[must_use]
    pub fn contains(property: TextProperty, needle: impl Into<String>) -> Self {
        Self::Contains {
            property,
            needle: needle.into(),
        }
    }

    /// Evaluates the restriction against message fields, the way the mail
    /// client would: inclusive time bounds and case-insensitive substrings.
    #[must_use]
    pub fn matches(&self, fields: &MessageFields<'_>) -> bool {
        match self {
            Self::ReceivedOnOrAfter(at) => fields.received >= *at,
            Self::ReceivedOnOrBefore(at) => fields.received <= *at,
            Self::Contains { property, needle } => fields
                .text(*property)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::HasAttachment => fields.has_attachment,
        }
    }
}

/// Borrowed view of the message fields a restriction can inspect.
#[derive(Debug, Clone, Copy)]
pub struct MessageFields<'a> {
    /// Time the message was received.
    pub received: NaiveDateTime,
    /// Sender email address.
    pub from_email: &'a str,
    /// Sender display name.
    pub from_name: &'a str,
    /// Carbon-copy recipients as displayed.
    pub cc: &'a str,
    /// Subject line.
    pub subject: &'a str,
    /// Plain-text body.
    pub text_body: &'a str,
    /// HTML body.
    pub html_body: &'a str,
    /// Whether any attachment is present.
    pub has_attachment: bool,
}

impl MessageFields<'_> {
    /// Returns the value of a text property.
    #[must_use]
    pub const fn text(&self, property: TextProperty) -> &str {
        match property {
            TextProperty::FromEmail => self.from_email,
            TextProperty::FromName => self.from_name,
            TextProperty::Cc => self.cc,
            TextProperty::Subject => self.subject,
            TextProperty::TextBody => self.text_body,
            TextProperty::HtmlBody => self.html_body,
        }
    }
}

/// A restriction together with its rendered query text.
///
/// Backends that speak the mail client's query language use [`as_str`];
/// backends that filter in process use [`restriction`].
///
/// [`as_str`]: Predicate::as_str
/// [`restriction`]: Predicate::restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    restriction: Restriction,
    query: String,
}

impl Predicate {
    /// Renders a restriction, formatting any timestamp with `format`.
    #[must_use]
    pub fn new(restriction: Restriction, format: &DateFormat) -> Self {
        let mut query = String::new();
        write_restriction(&mut query, &restriction, format);
        Self { restriction, query }
    }

    /// Returns the typed restriction.
    #[must_use]
    pub const fn restriction(&self) -> &Restriction {
        &self.restriction
    }

    /// Returns the rendered query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
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
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn fields() -> MessageFields<'static> {
        MessageFields {
            received: at(2022, 12, 10),
            from_email: "Gillian@Example.com",
            from_name: "Gillian Moore",
            cc: "office@example.com",
            subject: "SCART referral",
            text_body: "see attached",
            html_body: "<p>see attached</p>",
            has_attachment: false,
        }
    }

    #[test]
    fn test_time_bounds_are_inclusive() {
        let f = fields();
        assert!(Restriction::ReceivedOnOrAfter(at(2022, 12, 10)).matches(&f));
        assert!(Restriction::ReceivedOnOrBefore(at(2022, 12, 10)).matches(&f));
        assert!(!Restriction::ReceivedOnOrAfter(at(2022, 12, 11)).matches(&f));
        assert!(!Restriction::ReceivedOnOrBefore(at(2022, 12, 9)).matches(&f));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let f = fields();
        assert!(Restriction::contains(TextProperty::FromEmail, "gillian@example").matches(&f));
        assert!(Restriction::contains(TextProperty::Subject, "scart").matches(&f));
        assert!(!Restriction::contains(TextProperty::Subject, "invoice").matches(&f));
        assert!(Restriction::contains(TextProperty::HtmlBody, "<p>").matches(&f));
    }

    #[test]
    fn test_has_attachment() {
        let mut f = fields();
        assert!(!Restriction::HasAttachment.matches(&f));
        f.has_attachment = true;
        assert!(Restriction::HasAttachment.matches(&f));
    }

    #[test]
    fn test_predicate_keeps_both_forms() {
        let restriction = Restriction::contains(TextProperty::Cc, "office");
        let predicate = Predicate::new(restriction.clone(), &DateFormat::default());
        assert_eq!(predicate.restriction(), &restriction);
        assert_eq!(
            predicate.to_string(),
            "@SQL=\"urn:schemas:httpmail:cc\" like '%office%'"
        );
    }
}
