//! Composing and sending messages.
//!
//! Attaching a file can silently fail while a sync agent holds it, so every
//! draft is checked before it is sent. A draft with missing attachments is
//! discarded and the whole message is composed again after a delay, up to
//! the policy's attempt limit. The message is sent at most once.

use std::path::PathBuf;

use crate::client::{Draft, Outbox};
use crate::config::RetryPolicy;
use crate::error::{Error, Result};
use crate::time::Clock;

/// A message to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Recipient address or addresses, as the client accepts them.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: Option<String>,
    /// HTML body, used only when there is no plain body.
    pub html_body: Option<String>,
    /// Files to attach.
    pub attachments: Vec<PathBuf>,
}

impl OutgoingMessage {
    /// Creates a new outgoing message.
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html_body(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    /// Checks required fields and attachment files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMessage`] for an empty recipient or subject,
    /// and [`Error::AttachmentMissing`] for a file that does not exist.
    pub fn validate(&self) -> Result<()> {
        if self.to.trim().is_empty() {
            return Err(Error::InvalidMessage("recipient is required".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(Error::InvalidMessage("subject is required".to_string()));
        }
        if let Some(missing) = self.attachments.iter().find(|path| !path.is_file()) {
            return Err(Error::AttachmentMissing(missing.clone()));
        }
        Ok(())
    }

    fn fill<D: Draft>(&self, draft: &mut D) -> Result<()> {
        draft.set_to(&self.to)?;
        draft.set_subject(&self.subject)?;

        if let Some(body) = &self.body {
            draft.set_body(body)?;
        } else if let Some(html) = &self.html_body {
            draft.set_html_body(html)?;
        }

        for path in &self.attachments {
            draft.add_attachment(path)?;
        }
        Ok(())
    }
}

/// Sends a message, verifying that every attachment made it onto the draft.
///
/// # Errors
///
/// Returns a validation error before composing anything,
/// [`Error::AttachmentFailure`] once `policy.max_attempts` drafts came up
/// short, or [`Error::Client`] if the client fails.
pub fn send_email<O: Outbox>(
    outbox: &O,
    message: &OutgoingMessage,
    policy: &RetryPolicy,
    clock: &impl Clock,
) -> Result<()> {
    message.validate()?;

    let expected = message.attachments.len();
    let max_attempts = policy.max_attempts.max(1);
    let mut attached = 0;

    for attempt in 1..=max_attempts {
        let mut draft = outbox.compose()?;
        if let Err(err) = message.fill(&mut draft) {
            draft.discard()?;
            return Err(err);
        }

        attached = draft.attachment_count()?;
        if attached == expected {
            draft.send()?;
            tracing::info!(attempt, to = %message.to, "Message sent");
            return Ok(());
        }

        draft.discard()?;
        tracing::warn!(attempt, expected, attached, "Attachments missing from draft");
        if attempt < max_attempts {
            clock.sleep(policy.retry_delay());
        }
    }

    Err(Error::AttachmentFailure {
        attempts: max_attempts,
        expected,
        attached,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::memory::MemoryOutbox;
    use crate::time::MockClock;
    use std::time::Duration;

    fn files(dir: &tempfile::TempDir, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                std::fs::write(&path, name.as_bytes()).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_plain_body_wins() {
        let outbox = MemoryOutbox::new();
        let message = OutgoingMessage::new("a@example.com", "Hi")
            .body("plain")
            .html_body("<b>html</b>");
        send_email(&outbox, &message, &RetryPolicy::default(), &MockClock::new()).unwrap();

        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body.as_deref(), Some("plain"));
        assert_eq!(sent[0].html_body, None);
    }

    #[test]
    fn test_html_body_used_alone() {
        let outbox = MemoryOutbox::new();
        let message = OutgoingMessage::new("a@example.com", "Hi").html_body("<b>html</b>");
        send_email(&outbox, &message, &RetryPolicy::default(), &MockClock::new()).unwrap();
        assert_eq!(outbox.sent()[0].html_body.as_deref(), Some("<b>html</b>"));
    }

    #[test]
    fn test_no_attachments_never_retries() {
        let outbox = MemoryOutbox::new();
        let clock = MockClock::new();
        send_email(
            &outbox,
            &OutgoingMessage::new("a@example.com", "Hi"),
            &RetryPolicy::default(),
            &clock,
        )
        .unwrap();
        assert_eq!(outbox.composed(), 1);
        assert_eq!(clock.sleeps(), 0);
    }

    #[test]
    fn test_retries_until_attached() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = MemoryOutbox::with_attach_limits([1, 0]);
        let clock = MockClock::new();
        let mut message = OutgoingMessage::new("a@example.com", "Report");
        message.attachments = files(&dir, &["a.pdf", "b.pdf"]);

        send_email(&outbox, &message, &RetryPolicy::default(), &clock).unwrap();

        assert_eq!(outbox.composed(), 3);
        assert_eq!(outbox.discarded(), 2);
        assert_eq!(outbox.sent().len(), 1);
        assert_eq!(outbox.sent()[0].attachments, message.attachments);
        assert_eq!(clock.sleeps(), 2);
        assert_eq!(clock.offset(), Duration::from_secs(60));
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = MemoryOutbox::with_attach_limits([0; 10]);
        let clock = MockClock::new();
        let message =
            OutgoingMessage::new("a@example.com", "Report").attach(files(&dir, &["a.pdf"]).remove(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(5));

        let err = send_email(&outbox, &message, &policy, &clock).unwrap_err();

        assert!(matches!(
            err,
            Error::AttachmentFailure {
                attempts: 3,
                expected: 1,
                attached: 0
            }
        ));
        assert_eq!(outbox.composed(), 3);
        assert_eq!(outbox.discarded(), 3);
        assert!(outbox.sent().is_empty());
        assert_eq!(clock.sleeps(), 2);
    }

    #[test]
    fn test_failed_fill_discards_draft() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = MemoryOutbox::rejecting_attachments("file is locked");
        let clock = MockClock::new();
        let message =
            OutgoingMessage::new("a@example.com", "Report").attach(files(&dir, &["a.pdf"]).remove(0));

        let err = send_email(&outbox, &message, &RetryPolicy::default(), &clock).unwrap_err();

        assert!(matches!(err, Error::Client(_)));
        assert_eq!(outbox.composed(), 1);
        assert_eq!(outbox.discarded(), 1);
        assert!(outbox.sent().is_empty());
        assert_eq!(clock.sleeps(), 0);
    }

    #[test]
    fn test_missing_attachment_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = MemoryOutbox::new();
        let message =
            OutgoingMessage::new("a@example.com", "Report").attach(dir.path().join("absent.pdf"));

        let err =
            send_email(&outbox, &message, &RetryPolicy::default(), &MockClock::new()).unwrap_err();
        assert!(matches!(err, Error::AttachmentMissing(_)));
        assert_eq!(outbox.composed(), 0);
    }

    #[test]
    fn test_required_fields() {
        assert!(matches!(
            OutgoingMessage::new("", "Hi").validate(),
            Err(Error::InvalidMessage(_))
        ));
        assert!(matches!(
            OutgoingMessage::new("a@example.com", " ").validate(),
            Err(Error::InvalidMessage(_))
        ));
    }
}
