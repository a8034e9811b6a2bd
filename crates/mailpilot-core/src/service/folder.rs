//! Folder resolution and message moves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::Mailbox;
use crate::config::Config;
use crate::error::{Error, Result};

/// Root-to-leaf sequence of folder names, e.g. `Inbox / Admin / Church`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderPath(Vec<String>);

impl FolderPath {
    /// Creates a path from its segments.
    #[must_use]
    pub fn new(segments: impl IntoIterator<Item: Into<String>>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The `Inbox` folder.
    #[must_use]
    pub fn inbox() -> Self {
        Self::new(["Inbox"])
    }

    /// Returns a path one level deeper.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Returns the folder names, root first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` for the empty path, which denotes the account root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the folder names.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

/// Parses `Inbox/Admin/Church`; blank segments are ignored.
impl FromStr for FolderPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(
            s.split('/').map(str::trim).filter(|segment| !segment.is_empty()),
        ))
    }
}

impl<const N: usize> From<[&str; N]> for FolderPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<Vec<String>> for FolderPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl<'a> IntoIterator for &'a FolderPath {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Returns the root folder of the configured account.
///
/// # Errors
///
/// Returns [`Error::Config`] if no account is configured, or
/// [`Error::FolderNotFound`] if the client does not know the account.
pub fn open_account<M: Mailbox>(mailbox: &M, config: &Config) -> Result<M::Folder> {
    if config.account.trim().is_empty() {
        return Err(Error::Config("account is required".to_string()));
    }
    tracing::debug!("Opening account {}", config.account);
    mailbox
        .account_root(&config.account)
        .map_err(|source| Error::FolderNotFound {
            path: FolderPath::new([config.account.as_str()]),
            source,
        })
}

/// Resolves a folder path below `root`, one level per name.
///
/// Resolution is all-or-nothing: any missing segment fails the whole lookup.
/// The empty path resolves to `root` itself.
///
/// # Errors
///
/// Returns [`Error::FolderNotFound`] carrying the full requested path.
pub fn find_folder<M: Mailbox>(mailbox: &M, root: &M::Folder, path: &FolderPath) -> Result<M::Folder> {
    let mut folder = root.clone();
    for name in path {
        tracing::debug!("Descending into folder {:?}", name);
        folder = mailbox
            .subfolder(&folder, name)
            .map_err(|source| Error::FolderNotFound {
                path: path.clone(),
                source,
            })?;
    }
    Ok(folder)
}

/// Moves messages into the folder at `path`.
///
/// The destination is resolved before anything moves, so a bad path leaves
/// every message where it was.
///
/// # Errors
///
/// Returns [`Error::FolderNotFound`] if the destination does not exist, or
/// [`Error::Client`] if a move fails.
pub fn move_emails<M: Mailbox>(
    mailbox: &M,
    root: &M::Folder,
    messages: &[M::Message],
    path: &FolderPath,
) -> Result<()> {
    let destination = find_folder(mailbox, root, path)?;
    for message in messages {
        mailbox.move_message(message, &destination)?;
    }
    tracing::info!("Moved {} messages to {}", messages.len(), path);
    Ok(())
}
