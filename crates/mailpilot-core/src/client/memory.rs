//! In-memory mail client.
//!
//! [`MemoryMailbox`] and [`MemoryOutbox`] implement the client traits without
//! any automation surface. Restrictions are evaluated in process with the
//! same semantics the real client applies, and every query, move and send is
//! recorded so callers can assert on them.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::NaiveDateTime;
use mailpilot_query::{MessageFields, Predicate};

use super::{ClientError, Draft, Envelope, Mailbox, Outbox};

/// Identifier of a folder in a [`MemoryMailbox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderId(usize);

/// Identifier of a message in a [`MemoryMailbox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(usize);

/// Handle on an attachment: owning message and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentRef {
    message: MessageId,
    index: usize,
}

/// An item collection: message ids in client order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryItems {
    ids: Vec<MessageId>,
}

/// An attachment stored with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    /// Original file name.
    pub name: String,
    /// File contents.
    pub content: Vec<u8>,
}

/// A message stored in a [`MemoryMailbox`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Time the message was received.
    pub received: NaiveDateTime,
    /// Subject line.
    pub subject: String,
    /// Sender display name.
    pub sender_name: String,
    /// Sender email address.
    pub sender_email: String,
    /// Carbon-copy recipients.
    pub cc: String,
    /// Plain-text body.
    pub body: String,
    /// HTML body.
    pub html_body: String,
    /// Attachments in order.
    pub attachments: Vec<StoredAttachment>,
}

impl StoredMessage {
    /// Creates a message with only a subject and receive time.
    #[must_use]
    pub fn new(subject: impl Into<String>, received: NaiveDateTime) -> Self {
        Self {
            received,
            subject: subject.into(),
            sender_name: String::new(),
            sender_email: String::new(),
            cc: String::new(),
            body: String::new(),
            html_body: String::new(),
            attachments: Vec::new(),
        }
    }

    /// Sets the sender.
    #[must_use]
    pub fn sender(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.sender_name = name.into();
        self.sender_email = email.into();
        self
    }

    /// Sets the carbon-copy line.
    #[must_use]
    pub fn cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = cc.into();
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html_body(mut self, html: impl Into<String>) -> Self {
        self.html_body = html.into();
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attachment(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.attachments.push(StoredAttachment {
            name: name.into(),
            content: content.into(),
        });
        self
    }

    fn fields(&self) -> MessageFields<'_> {
        MessageFields {
            received: self.received,
            from_email: &self.sender_email,
            from_name: &self.sender_name,
            cc: &self.cc,
            subject: &self.subject,
            text_body: &self.body,
            html_body: &self.html_body,
            has_attachment: !self.attachments.is_empty(),
        }
    }
}

#[derive(Debug)]
struct FolderNode {
    name: String,
    parent: Option<FolderId>,
}

#[derive(Debug)]
struct StoredEntry {
    folder: FolderId,
    message: StoredMessage,
}

#[derive(Debug, Default)]
struct MailboxState {
    folders: Vec<FolderNode>,
    messages: Vec<StoredEntry>,
    queries: Vec<String>,
}

/// A single-threaded in-memory folder tree.
#[derive(Debug, Default)]
pub struct MemoryMailbox {
    state: RefCell<MailboxState>,
}

impl MemoryMailbox {
    /// Creates an empty mailbox with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account root folder.
    pub fn add_account(&mut self, name: impl Into<String>) -> FolderId {
        self.insert_folder(None, name.into())
    }

    /// Adds a folder under `parent`.
    pub fn add_folder(&mut self, parent: FolderId, name: impl Into<String>) -> FolderId {
        self.insert_folder(Some(parent), name.into())
    }

    fn insert_folder(&mut self, parent: Option<FolderId>, name: String) -> FolderId {
        let folders = &mut self.state.get_mut().folders;
        folders.push(FolderNode { name, parent });
        FolderId(folders.len() - 1)
    }

    /// Stores a message in `folder`.
    pub fn add_message(&mut self, folder: FolderId, message: StoredMessage) -> MessageId {
        let messages = &mut self.state.get_mut().messages;
        messages.push(StoredEntry { folder, message });
        MessageId(messages.len() - 1)
    }

    /// Returns the folder currently holding a message.
    #[must_use]
    pub fn folder_of(&self, id: MessageId) -> Option<FolderId> {
        self.state.borrow().messages.get(id.0).map(|e| e.folder)
    }

    /// Returns the messages in a folder, in insertion order.
    #[must_use]
    pub fn messages_in(&self, folder: FolderId) -> Vec<MessageId> {
        self.state
            .borrow()
            .messages
            .iter()
            .enumerate()
            .filter(|(_, e)| e.folder == folder)
            .map(|(i, _)| MessageId(i))
            .collect()
    }

    /// Returns a copy of a stored message.
    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<StoredMessage> {
        self.state
            .borrow()
            .messages
            .get(id.0)
            .map(|e| e.message.clone())
    }

    /// Returns every query passed to [`Mailbox::restrict`], in order.
    #[must_use]
    pub fn applied_queries(&self) -> Vec<String> {
        self.state.borrow().queries.clone()
    }

    fn with_message<T>(
        &self,
        id: MessageId,
        f: impl FnOnce(&StoredMessage) -> T,
    ) -> Result<T, ClientError> {
        self.state
            .borrow()
            .messages
            .get(id.0)
            .map(|e| f(&e.message))
            .ok_or_else(|| ClientError::Operation(format!("unknown message {}", id.0)))
    }

    fn with_attachment<T>(
        &self,
        attachment: &AttachmentRef,
        f: impl FnOnce(&StoredAttachment) -> T,
    ) -> Result<T, ClientError> {
        self.with_message(attachment.message, |m| m.attachments.get(attachment.index).map(f))?
            .ok_or_else(|| ClientError::Operation(format!("unknown attachment {attachment:?}")))
    }
}

impl Mailbox for MemoryMailbox {
    type Folder = FolderId;
    type Items = MemoryItems;
    type Message = MessageId;
    type Attachment = AttachmentRef;

    fn account_root(&self, account: &str) -> Result<FolderId, ClientError> {
        self.state
            .borrow()
            .folders
            .iter()
            .position(|f| f.parent.is_none() && f.name == account)
            .map(FolderId)
            .ok_or_else(|| ClientError::NoSuchFolder(account.to_string()))
    }

    fn subfolder(&self, parent: &FolderId, name: &str) -> Result<FolderId, ClientError> {
        self.state
            .borrow()
            .folders
            .iter()
            .position(|f| f.parent == Some(*parent) && f.name == name)
            .map(FolderId)
            .ok_or_else(|| ClientError::NoSuchFolder(name.to_string()))
    }

    fn items(&self, folder: &FolderId) -> Result<MemoryItems, ClientError> {
        Ok(MemoryItems {
            ids: self.messages_in(*folder),
        })
    }

    fn restrict(
        &self,
        items: &MemoryItems,
        predicate: &Predicate,
    ) -> Result<MemoryItems, ClientError> {
        let mut state = self.state.borrow_mut();
        state.queries.push(predicate.as_str().to_string());

        let ids = items
            .ids
            .iter()
            .copied()
            .filter(|id| {
                state
                    .messages
                    .get(id.0)
                    .is_some_and(|e| predicate.restriction().matches(&e.message.fields()))
            })
            .collect();
        Ok(MemoryItems { ids })
    }

    fn collect(&self, items: MemoryItems) -> Result<Vec<MessageId>, ClientError> {
        Ok(items.ids)
    }

    fn envelope(&self, message: &MessageId) -> Result<Envelope, ClientError> {
        self.with_message(*message, |m| Envelope {
            subject: m.subject.clone(),
            sender_name: m.sender_name.clone(),
            sender_email: m.sender_email.clone(),
        })
    }

    fn attachments(&self, message: &MessageId) -> Result<Vec<AttachmentRef>, ClientError> {
        self.with_message(*message, |m| {
            (0..m.attachments.len())
                .map(|index| AttachmentRef {
                    message: *message,
                    index,
                })
                .collect()
        })
    }

    fn attachment_name(&self, attachment: &AttachmentRef) -> Result<String, ClientError> {
        self.with_attachment(attachment, |a| a.name.clone())
    }

    fn save_attachment(&self, attachment: &AttachmentRef, path: &Path) -> Result<(), ClientError> {
        let content = self.with_attachment(attachment, |a| a.content.clone())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn move_message(&self, message: &MessageId, destination: &FolderId) -> Result<(), ClientError> {
        let mut state = self.state.borrow_mut();
        if destination.0 >= state.folders.len() {
            return Err(ClientError::NoSuchFolder(format!("#{}", destination.0)));
        }
        let entry = state
            .messages
            .get_mut(message.0)
            .ok_or_else(|| ClientError::Operation(format!("unknown message {}", message.0)))?;
        entry.folder = *destination;
        Ok(())
    }
}

/// A message handed to [`Draft::send`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentMessage {
    /// Recipient line.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body, if set.
    pub body: Option<String>,
    /// HTML body, if set.
    pub html_body: Option<String>,
    /// Attached file paths.
    pub attachments: Vec<PathBuf>,
}

#[derive(Debug, Default)]
struct OutboxState {
    composed: usize,
    discarded: usize,
    sent: Vec<SentMessage>,
    attach_limits: VecDeque<usize>,
    attach_error: Option<String>,
}

/// Records composed, discarded and sent drafts.
///
/// Attachment limits simulate a sync agent holding files: the n-th draft
/// silently keeps at most the n-th limit of attachments. Drafts beyond the
/// scripted limits attach everything.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutbox {
    state: Rc<RefCell<OutboxState>>,
}

impl MemoryOutbox {
    /// Creates an outbox that attaches every file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an outbox whose successive drafts keep at most the given
    /// number of attachments.
    #[must_use]
    pub fn with_attach_limits(limits: impl IntoIterator<Item = usize>) -> Self {
        let outbox = Self::default();
        outbox.state.borrow_mut().attach_limits = limits.into_iter().collect();
        outbox
    }

    /// Creates an outbox whose drafts reject every attachment with an error.
    #[must_use]
    pub fn rejecting_attachments(reason: impl Into<String>) -> Self {
        let outbox = Self::default();
        outbox.state.borrow_mut().attach_error = Some(reason.into());
        outbox
    }

    /// Messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.borrow().sent.clone()
    }

    /// Number of drafts created.
    #[must_use]
    pub fn composed(&self) -> usize {
        self.state.borrow().composed
    }

    /// Number of drafts discarded.
    #[must_use]
    pub fn discarded(&self) -> usize {
        self.state.borrow().discarded
    }
}

impl Outbox for MemoryOutbox {
    type Draft = MemoryDraft;

    fn compose(&self) -> Result<MemoryDraft, ClientError> {
        let mut state = self.state.borrow_mut();
        state.composed += 1;
        let limit = state.attach_limits.pop_front();
        Ok(MemoryDraft {
            state: Rc::clone(&self.state),
            limit,
            message: SentMessage::default(),
        })
    }
}

/// Draft created by [`MemoryOutbox`].
#[derive(Debug)]
pub struct MemoryDraft {
    state: Rc<RefCell<OutboxState>>,
    limit: Option<usize>,
    message: SentMessage,
}

impl Draft for MemoryDraft {
    fn set_to(&mut self, to: &str) -> Result<(), ClientError> {
        self.message.to = to.to_string();
        Ok(())
    }

    fn set_subject(&mut self, subject: &str) -> Result<(), ClientError> {
        self.message.subject = subject.to_string();
        Ok(())
    }

    fn set_body(&mut self, body: &str) -> Result<(), ClientError> {
        self.message.body = Some(body.to_string());
        Ok(())
    }

    fn set_html_body(&mut self, html: &str) -> Result<(), ClientError> {
        self.message.html_body = Some(html.to_string());
        Ok(())
    }

    fn add_attachment(&mut self, path: &Path) -> Result<(), ClientError> {
        if let Some(reason) = &self.state.borrow().attach_error {
            return Err(ClientError::Operation(reason.clone()));
        }
        if self
            .limit
            .is_none_or(|limit| self.message.attachments.len() < limit)
        {
            self.message.attachments.push(path.to_path_buf());
        }
        Ok(())
    }

    fn attachment_count(&self) -> Result<usize, ClientError> {
        Ok(self.message.attachments.len())
    }

    fn send(self) -> Result<(), ClientError> {
        self.state.borrow_mut().sent.push(self.message);
        Ok(())
    }

    fn discard(self) -> Result<(), ClientError> {
        self.state.borrow_mut().discarded += 1;
        Ok(())
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
    use mailpilot_query::{DateFormat, Restriction, TextProperty};

    fn received() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 12, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_folder_lookup() {
        let mut mailbox = MemoryMailbox::new();
        let root = mailbox.add_account("me@example.com");
        let inbox = mailbox.add_folder(root, "Inbox");

        assert_eq!(mailbox.account_root("me@example.com").unwrap(), root);
        assert_eq!(mailbox.subfolder(&root, "Inbox").unwrap(), inbox);
        assert!(matches!(
            mailbox.subfolder(&inbox, "Inbox"),
            Err(ClientError::NoSuchFolder(_))
        ));
        assert!(mailbox.account_root("other@example.com").is_err());
    }

    #[test]
    fn test_restrict_records_query_and_narrows() {
        let mut mailbox = MemoryMailbox::new();
        let root = mailbox.add_account("me");
        let a = mailbox.add_message(root, StoredMessage::new("Quarterly report", received()));
        mailbox.add_message(root, StoredMessage::new("Lunch?", received()));

        let items = mailbox.items(&root).unwrap();
        let predicate = Predicate::new(
            Restriction::contains(TextProperty::Subject, "report"),
            &DateFormat::default(),
        );
        let narrowed = mailbox.restrict(&items, &predicate).unwrap();

        assert_eq!(mailbox.collect(narrowed).unwrap(), vec![a]);
        assert_eq!(mailbox.collect(items).unwrap().len(), 2);
        assert_eq!(mailbox.applied_queries(), vec![predicate.as_str().to_string()]);
    }

    #[test]
    fn test_move_message() {
        let mut mailbox = MemoryMailbox::new();
        let root = mailbox.add_account("me");
        let archive = mailbox.add_folder(root, "Archive");
        let id = mailbox.add_message(root, StoredMessage::new("hi", received()));

        mailbox.move_message(&id, &archive).unwrap();
        assert_eq!(mailbox.folder_of(id), Some(archive));
        assert!(mailbox.messages_in(root).is_empty());
    }

    #[test]
    fn test_outbox_attach_limits() {
        let outbox = MemoryOutbox::with_attach_limits([1]);

        let mut first = outbox.compose().unwrap();
        first.add_attachment(Path::new("a.pdf")).unwrap();
        first.add_attachment(Path::new("b.pdf")).unwrap();
        assert_eq!(first.attachment_count().unwrap(), 1);
        first.discard().unwrap();

        let mut second = outbox.compose().unwrap();
        second.add_attachment(Path::new("a.pdf")).unwrap();
        second.add_attachment(Path::new("b.pdf")).unwrap();
        assert_eq!(second.attachment_count().unwrap(), 2);
        second.send().unwrap();

        assert_eq!(outbox.composed(), 2);
        assert_eq!(outbox.discarded(), 1);
        assert_eq!(outbox.sent().len(), 1);
    }
}
