//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::client::ClientError;
use crate::filter::ValidationError;
use crate::service::FolderPath;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A folder path could not be resolved.
    #[error("Folder not found: {path}")]
    FolderNotFound {
        /// The full path that was requested.
        path: FolderPath,
        /// The lookup failure reported by the client.
        #[source]
        source: ClientError,
    },

    /// Attachments did not all make it onto the outgoing message.
    #[error("Attachment failure after {attempts} attempts: {attached} of {expected} attached")]
    AttachmentFailure {
        /// Number of attempts made.
        attempts: u32,
        /// Number of files requested.
        expected: usize,
        /// Number of files present on the last draft.
        attached: usize,
    },

    /// An attachment file does not exist.
    #[error("Attachment not found: {}", .0.display())]
    AttachmentMissing(PathBuf),

    /// Filter bounds contradict each other or the current time.
    #[error("Inconsistent filter: {}", join_messages(.0))]
    FilterInconsistency(Vec<ValidationError>),

    /// A filter date could not be understood.
    #[error("Date error: {0}")]
    Date(#[from] mailpilot_query::DateError),

    /// An outgoing message is missing a required field.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The mail client rejected an operation.
    #[error("Mail client error: {0}")]
    Client(#[from] ClientError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns a remedy the user can act on, if there is an obvious one.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::FolderNotFound { .. } => {
                Some("Check the folder names and their nesting in the mail client.")
            }
            Self::AttachmentFailure { .. } => Some(
                "Pause file synchronisation (e.g. OneDrive) for the attachment folder and try again.",
            ),
            Self::AttachmentMissing(_) => Some("Check the attachment path."),
            Self::FilterInconsistency(_) => {
                Some("The start date must not be after the stop date or in the future.")
            }
            Self::Date(_) => Some("Write dates day first, e.g. 10/12/22 or 12/12/22 23:59."),
            _ => None,
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
