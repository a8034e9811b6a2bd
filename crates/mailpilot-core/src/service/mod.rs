//! Core services for mail automation.
//!
//! This module provides the service layer that drives a [`Mailbox`] and an
//! [`Outbox`]: locating folders, filtering and downloading, moving and
//! sending.
//!
//! [`Mailbox`]: crate::client::Mailbox
//! [`Outbox`]: crate::client::Outbox

pub mod folder;
pub mod mail;
pub mod send;

pub use folder::{FolderPath, find_folder, move_emails, open_account};
pub use mail::{
    UniqueProperties, download_attachments, find_sender_emails, get_emails, unique_properties,
};
pub use send::{OutgoingMessage, send_email};
