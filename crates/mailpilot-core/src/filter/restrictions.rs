//! Translation of a filter into restrictions.

use chrono::NaiveDateTime;
use mailpilot_query::{Restriction, TextProperty};

use super::model::FilterConfig;
use super::validation::check_bounds;
use crate::error::{Error, Result};

/// Builds the restrictions for a filter, in application order.
///
/// The order is fixed: start, stop, from_email, from_name, cc_email,
/// subject, body, html_body, has_attachment. The filter is validated first,
/// so an inconsistent filter yields no restrictions at all.
///
/// # Errors
///
/// Returns [`Error::Date`] for an unparseable bound and
/// [`Error::FilterInconsistency`] for contradictory bounds.
pub fn build_restrictions(filter: &FilterConfig, now: NaiveDateTime) -> Result<Vec<Restriction>> {
    let (start, stop) = filter.bounds()?;
    check_bounds(start, stop, now).map_err(Error::FilterInconsistency)?;

    let mut restrictions = Vec::new();
    restrictions.extend(start.map(Restriction::ReceivedOnOrAfter));
    restrictions.extend(stop.map(Restriction::ReceivedOnOrBefore));

    let texts = [
        (TextProperty::FromEmail, &filter.from_email),
        (TextProperty::FromName, &filter.from_name),
        (TextProperty::Cc, &filter.cc_email),
        (TextProperty::Subject, &filter.subject),
        (TextProperty::TextBody, &filter.body),
        (TextProperty::HtmlBody, &filter.html_body),
    ];
    for (property, value) in texts {
        if let Some(needle) = value {
            restrictions.push(Restriction::contains(property, needle.as_str()));
        }
    }

    if filter.has_attachment == Some(true) {
        restrictions.push(Restriction::HasAttachment);
    }

    Ok(restrictions)
}
