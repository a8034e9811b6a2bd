//! Restriction serialization helpers.
//!
//! Two syntaxes are produced: a bracketed field comparison for the received
//! time (`[ReceivedTime] >= '...'`) and a namespaced property query for
//! everything else (`@SQL="urn:schemas:httpmail:subject" like '%...%'`).

use std::fmt::Write;

use crate::date::{DateFormat, format_datetime};
use crate::restriction::{HAS_ATTACHMENT_PROPERTY, Restriction};

/// Writes a restriction in the mail client's query syntax.
pub fn write_restriction(buf: &mut String, restriction: &Restriction, format: &DateFormat) {
    match restriction {
        Restriction::ReceivedOnOrAfter(at) => {
            buf.push_str("[ReceivedTime] >= ");
            write_quoted(buf, &format_datetime(at, format));
        }
        Restriction::ReceivedOnOrBefore(at) => {
            buf.push_str("[ReceivedTime] <= ");
            write_quoted(buf, &format_datetime(at, format));
        }
        Restriction::Contains { property, needle } => {
            let _ = write!(buf, "@SQL=\"{}\" like '%", property.schema_name());
            write_like_literal(buf, needle);
            buf.push_str("%'");
        }
        Restriction::HasAttachment => {
            let _ = write!(buf, "@SQL=\"{HAS_ATTACHMENT_PROPERTY}\" = 1");
        }
    }
}

/// Writes a single-quoted string literal, doubling embedded quotes.
pub fn write_quoted(buf: &mut String, s: &str) {
    buf.push('\'');
    push_doubling_quotes(buf, s);
    buf.push('\'');
}

/// Writes text for use inside a quoted `like` pattern so that it matches
/// literally: quotes are doubled and the wildcards `%`, `_` and the bracket
/// `[` are wrapped in brackets.
pub fn write_like_literal(buf: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '%' | '_' | '[' => {
                buf.push('[');
                buf.push(c);
                buf.push(']');
            }
            '\'' => buf.push_str("''"),
            _ => buf.push(c),
        }
    }
}

fn push_doubling_quotes(buf: &mut String, s: &str) {
    for c in s.chars() {
        if c == '\'' {
            buf.push('\'');
        }
        buf.push(c);
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
    use crate::restriction::TextProperty;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn render(restriction: &Restriction) -> String {
        let mut buf = String::new();
        write_restriction(&mut buf, restriction, &DateFormat::default());
        buf
    }

    /// Reverses `write_like_literal`, returning `None` on malformed input.
    fn unescape_like(escaped: &str) -> Option<String> {
        let mut out = String::new();
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    if chars.next()? != '\'' {
                        return None;
                    }
                    out.push('\'');
                }
                '[' => {
                    let inner = chars.next()?;
                    if chars.next()? != ']' {
                        return None;
                    }
                    out.push(inner);
                }
                '%' | '_' => return None,
                _ => out.push(c),
            }
        }
        Some(out)
    }

    #[test]
    fn test_received_bounds() {
        let at = NaiveDate::from_ymd_opt(2022, 12, 12)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(
            render(&Restriction::ReceivedOnOrAfter(at)),
            "[ReceivedTime] >= '2022-12-12 23:59 PM'"
        );
        assert_eq!(
            render(&Restriction::ReceivedOnOrBefore(at)),
            "[ReceivedTime] <= '2022-12-12 23:59 PM'"
        );
    }

    #[test]
    fn test_received_bound_custom_format() {
        let at = NaiveDate::from_ymd_opt(2022, 12, 10)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        let mut buf = String::new();
        let format = DateFormat::new("%m/%d/%Y %I:%M %p").unwrap();
        write_restriction(&mut buf, &Restriction::ReceivedOnOrAfter(at), &format);
        assert_eq!(buf, "[ReceivedTime] >= '12/10/2022 09:05 AM'");
    }

    #[test]
    fn test_text_properties() {
        assert_eq!(
            render(&Restriction::contains(TextProperty::FromEmail, "moore@hotmail")),
            "@SQL=\"urn:schemas:httpmail:fromemail\" like '%moore@hotmail%'"
        );
        assert_eq!(
            render(&Restriction::contains(TextProperty::TextBody, "invoice")),
            "@SQL=\"urn:schemas:httpmail:textdescription\" like '%invoice%'"
        );
    }

    #[test]
    fn test_has_attachment() {
        assert_eq!(
            render(&Restriction::HasAttachment),
            "@SQL=\"urn:schemas:httpmail:hasattachment\" = 1"
        );
    }

    #[test]
    fn test_escapes_quotes_and_wildcards() {
        assert_eq!(
            render(&Restriction::contains(TextProperty::Subject, "50% off' OR '1'='1")),
            "@SQL=\"urn:schemas:httpmail:subject\" like '%50[%] off'' OR ''1''=''1%'"
        );
        assert_eq!(
            render(&Restriction::contains(TextProperty::Subject, "file_[1]")),
            "@SQL=\"urn:schemas:httpmail:subject\" like '%file[_][[]1]%'"
        );
    }

    #[test]
    fn test_write_quoted() {
        let mut buf = String::new();
        write_quoted(&mut buf, "it's");
        assert_eq!(buf, "'it''s'");
    }

    proptest! {
        #[test]
        fn prop_like_literal_is_lossless(needle in ".*") {
            let mut escaped = String::new();
            write_like_literal(&mut escaped, &needle);
            prop_assert_eq!(unescape_like(&escaped), Some(needle));
        }
    }
}
