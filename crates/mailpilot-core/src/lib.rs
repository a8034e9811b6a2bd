//! # mailpilot-core
//!
//! Automation of a locally installed desktop mail client.
//!
//! This crate provides:
//! - Mail client traits and an in-memory backend
//! - Folder resolution by hierarchical path
//! - Declarative message filters, validated and applied in a fixed order
//! - Attachment download with exclusions and unique renaming
//! - Message moves, and sending with attachment verification and bounded retry
//! - JSON configuration
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use mailpilot_core::client::memory::{MemoryMailbox, StoredMessage};
//! use mailpilot_core::time::MockClock;
//! use mailpilot_core::{Config, FilterConfig, FolderPath, get_emails, open_account};
//!
//! let received = NaiveDate::from_ymd_opt(2022, 12, 11)
//!     .unwrap()
//!     .and_hms_opt(9, 30, 0)
//!     .unwrap();
//!
//! let mut mailbox = MemoryMailbox::new();
//! let root = mailbox.add_account("me@example.com");
//! let inbox = mailbox.add_folder(root, "Inbox");
//! mailbox.add_message(
//!     inbox,
//!     StoredMessage::new("Referral", received).sender("Gillian Moore", "moore@hotmail.com"),
//! );
//!
//! let config = Config::new("me@example.com");
//! let root = open_account(&mailbox, &config).unwrap();
//! let filter = FilterConfig::new()
//!     .start("10/12/22")
//!     .stop("12/12/22 23:59")
//!     .from_email("moore@hotmail");
//!
//! let clock = MockClock::at(received);
//! let inbox = FolderPath::inbox();
//! let messages = get_emails(&mailbox, &root, &inbox, &filter, &config, &clock).unwrap();
//! assert_eq!(messages.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
mod error;
pub mod filter;
pub mod service;
pub mod time;

pub use client::{ClientError, Draft, Envelope, Mailbox, Outbox};
pub use config::{Config, DownloadOptions, RetryPolicy};
pub use error::{Error, Result};
pub use filter::{
    FilterConfig, ValidationError, ValidationResult, build_restrictions, validate_filter,
};
pub use service::{
    FolderPath, OutgoingMessage, UniqueProperties, download_attachments, find_folder,
    find_sender_emails, get_emails, move_emails, open_account, send_email, unique_properties,
};
