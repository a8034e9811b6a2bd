//! Boundary to the desktop mail client's automation surface.
//!
//! The mail client is an external collaborator. Everything this crate needs
//! from it is expressed by two traits: [`Mailbox`] for folders, items and
//! messages, and [`Outbox`] for composing new messages. A COM backend renders
//! each [`Predicate`] with [`Predicate::as_str`]; backends that filter in
//! process evaluate [`Predicate::restriction`] instead.
//!
//! Handles are not expected to be reentrant or thread-safe, so none of the
//! traits require `Send` or `Sync`.

pub mod memory;

use std::path::Path;

use mailpilot_query::Predicate;

/// Errors reported by the mail client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A folder with this name does not exist under the parent.
    #[error("No such folder: {0}")]
    NoSuchFolder(String),

    /// Any other failed automation call.
    #[error("Operation failed: {0}")]
    Operation(String),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only header fields of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Subject line.
    pub subject: String,
    /// Sender display name.
    pub sender_name: String,
    /// Sender email address.
    pub sender_email: String,
}

/// Folders, item collections and messages of the mail client.
pub trait Mailbox {
    /// Handle on a folder.
    type Folder: Clone;
    /// Handle on a (possibly restricted) item collection.
    type Items;
    /// Handle on a message.
    type Message;
    /// Handle on an attachment of a message.
    type Attachment;

    /// Returns the top-level folder of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not configured in the client.
    fn account_root(&self, account: &str) -> Result<Self::Folder, ClientError>;

    /// Returns the direct child folder called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no such child exists.
    fn subfolder(&self, parent: &Self::Folder, name: &str) -> Result<Self::Folder, ClientError>;

    /// Returns all items of a folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be read.
    fn items(&self, folder: &Self::Folder) -> Result<Self::Items, ClientError>;

    /// Narrows an item collection. The input collection is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the client rejects the predicate.
    fn restrict(
        &self,
        items: &Self::Items,
        predicate: &Predicate,
    ) -> Result<Self::Items, ClientError>;

    /// Materializes a collection into messages, preserving its order.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be enumerated.
    fn collect(&self, items: Self::Items) -> Result<Vec<Self::Message>, ClientError>;

    /// Reads the header fields of a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be read.
    fn envelope(&self, message: &Self::Message) -> Result<Envelope, ClientError>;

    /// Lists the attachments of a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be read.
    fn attachments(&self, message: &Self::Message) -> Result<Vec<Self::Attachment>, ClientError>;

    /// Returns the original file name of an attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the attachment cannot be read.
    fn attachment_name(&self, attachment: &Self::Attachment) -> Result<String, ClientError>;

    /// Writes an attachment to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the attachment cannot be saved.
    fn save_attachment(&self, attachment: &Self::Attachment, path: &Path)
    -> Result<(), ClientError>;

    /// Moves a message into `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if the move fails.
    fn move_message(
        &self,
        message: &Self::Message,
        destination: &Self::Folder,
    ) -> Result<(), ClientError>;
}

/// Composes new outgoing messages.
pub trait Outbox {
    /// Draft type produced by [`Outbox::compose`].
    type Draft: Draft;

    /// Creates an empty draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot create a new item.
    fn compose(&self) -> Result<Self::Draft, ClientError>;
}

/// A message being composed.
pub trait Draft {
    /// Sets the recipient line (one or more addresses).
    ///
    /// # Errors
    ///
    /// Returns an error if the client rejects the value.
    fn set_to(&mut self, to: &str) -> Result<(), ClientError>;

    /// Sets the subject line.
    ///
    /// # Errors
    ///
    /// Returns an error if the client rejects the value.
    fn set_subject(&mut self, subject: &str) -> Result<(), ClientError>;

    /// Sets a plain-text body.
    ///
    /// # Errors
    ///
    /// Returns an error if the client rejects the value.
    fn set_body(&mut self, body: &str) -> Result<(), ClientError>;

    /// Sets an HTML body.
    ///
    /// # Errors
    ///
    /// Returns an error if the client rejects the value.
    fn set_html_body(&mut self, html: &str) -> Result<(), ClientError>;

    /// Attaches a local file.
    ///
    /// A client may accept the call yet fail to attach the file, for example
    /// while a sync agent holds it; [`Draft::attachment_count`] reveals that.
    ///
    /// # Errors
    ///
    /// Returns an error if the client rejects the call.
    fn add_attachment(&mut self, path: &Path) -> Result<(), ClientError>;

    /// Number of attachments actually present on the draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft cannot be read.
    fn attachment_count(&self) -> Result<usize, ClientError>;

    /// Sends the draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the client fails to send.
    fn send(self) -> Result<(), ClientError>;

    /// Throws the draft away without sending.
    ///
    /// # Errors
    ///
    /// Returns an error if the client fails to delete the draft.
    fn discard(self) -> Result<(), ClientError>
    where
        Self: Sized,
    {
        Ok(())
    }
}
