//! Filtering messages and extracting their attachments.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use mailpilot_query::Predicate;
use uuid::Uuid;

use super::folder::{FolderPath, find_folder};
use crate::client::Mailbox;
use crate::config::{Config, DownloadOptions};
use crate::error::Result;
use crate::filter::{FilterConfig, build_restrictions};
use crate::time::Clock;

/// Returns the messages of a folder that satisfy a filter.
///
/// The filter is validated against `clock` before anything reaches the
/// client. Each restriction then narrows the previous result, in the fixed
/// filter order. An empty filter returns the whole folder. Messages keep the
/// order the client reports them in.
///
/// # Errors
///
/// Returns an error if the filter is invalid, the folder cannot be found, or
/// the client rejects a restriction.
pub fn get_emails<M: Mailbox>(
    mailbox: &M,
    root: &M::Folder,
    path: &FolderPath,
    filter: &FilterConfig,
    config: &Config,
    clock: &impl Clock,
) -> Result<Vec<M::Message>> {
    let restrictions = build_restrictions(filter, clock.now())?;
    let folder = find_folder(mailbox, root, path)?;

    let mut items = mailbox.items(&folder)?;
    for restriction in restrictions {
        let predicate = Predicate::new(restriction, &config.date_format);
        tracing::debug!("Applying restriction {}", predicate);
        items = mailbox.restrict(&items, &predicate)?;
    }

    let messages = mailbox.collect(items)?;
    tracing::info!("Found {} messages in {}", messages.len(), path);
    Ok(messages)
}

/// Saves the attachments of `messages` into `dest`.
///
/// Attachments whose name contains an excluded pattern are skipped. Others
/// keep their original file name, or get a fresh unique name with the same
/// extension when `options.rename` is set. Existing files are overwritten.
/// `dest` is created if needed.
///
/// Returns the written paths in message and attachment order.
///
/// # Errors
///
/// Returns an error if `dest` cannot be created or an attachment cannot be
/// saved.
pub fn download_attachments<M: Mailbox>(
    mailbox: &M,
    messages: &[M::Message],
    dest: &Path,
    options: &DownloadOptions,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dest)?;

    let mut saved = Vec::new();
    for message in messages {
        for attachment in mailbox.attachments(message)? {
            let name = mailbox.attachment_name(&attachment)?;
            if !options.keeps(&name) {
                tracing::debug!("Skipping attachment {:?}", name);
                continue;
            }

            let file_name = if options.rename {
                unique_file_name(&name)
            } else {
                plain_file_name(&name).map_or_else(|| unique_file_name(&name), str::to_string)
            };
            let path = dest.join(file_name);
            mailbox.save_attachment(&attachment, &path)?;
            tracing::debug!("Saved attachment {:?} to {:?}", name, path);
            saved.push(path);
        }
    }

    tracing::info!("Downloaded {} attachments to {:?}", saved.len(), dest);
    Ok(saved)
}

/// Last path component of an attachment name, if it is a usable file name.
fn plain_file_name(name: &str) -> Option<&str> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        None
    } else {
        Some(last)
    }
}

/// A random name that keeps the extension of `name`.
fn unique_file_name(name: &str) -> String {
    let id = Uuid::new_v4();
    match plain_file_name(name)
        .and_then(|file| Path::new(file).extension())
        .and_then(|ext| ext.to_str())
    {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Distinct header values across a set of messages, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueProperties {
    /// Sender email addresses.
    pub from_email: BTreeSet<String>,
    /// Sender display names.
    pub from_name: BTreeSet<String>,
    /// Subject lines.
    pub subject: BTreeSet<String>,
}

/// Collects the distinct senders and subjects of `messages`.
///
/// # Errors
///
/// Returns an error if a message cannot be read.
pub fn unique_properties<M: Mailbox>(
    mailbox: &M,
    messages: &[M::Message],
) -> Result<UniqueProperties> {
    let mut properties = UniqueProperties::default();
    for message in messages {
        let envelope = mailbox.envelope(message)?;
        properties.from_email.insert(envelope.sender_email);
        properties.from_name.insert(envelope.sender_name);
        properties.subject.insert(envelope.subject);
    }
    Ok(properties)
}

/// Returns the distinct sender addresses of every message in a folder.
///
/// # Errors
///
/// Returns an error if the folder cannot be found or read.
pub fn find_sender_emails<M: Mailbox>(
    mailbox: &M,
    root: &M::Folder,
    path: &FolderPath,
) -> Result<BTreeSet<String>> {
    let folder = find_folder(mailbox, root, path)?;
    let messages = mailbox.collect(mailbox.items(&folder)?)?;

    let mut senders = BTreeSet::new();
    for message in &messages {
        senders.insert(mailbox.envelope(message)?.sender_email);
    }
    Ok(senders)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::memory::{FolderId, MemoryMailbox, StoredMessage};
    use crate::error::Error;
    use crate::time::MockClock;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 12, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn clock() -> MockClock {
        MockClock::at(at(31, 0))
    }

    fn mailbox() -> (MemoryMailbox, FolderId) {
        let mut mailbox = MemoryMailbox::new();
        let root = mailbox.add_account("me@example.com");
        let inbox = mailbox.add_folder(root, "Inbox");
        mailbox.add_message(
            inbox,
            StoredMessage::new("SCART referral", at(9, 10))
                .sender("Gillian Moore", "moore@hotmail.com")
                .attachment("scan.pdf", b"pdf".to_vec()),
        );
        mailbox.add_message(
            inbox,
            StoredMessage::new("Rota", at(11, 8)).sender("Church Office", "office@church.org"),
        );
        mailbox.add_message(
            inbox,
            StoredMessage::new("Re: SCART referral", at(12, 23))
                .sender("Gillian Moore", "moore@hotmail.com")
                .cc("office@church.org"),
        );
        (mailbox, root)
    }

    #[test]
    fn test_empty_filter_returns_folder_in_order() {
        let (mailbox, root) = mailbox();
        let config = Config::new("me@example.com");
        let messages = get_emails(
            &mailbox,
            &root,
            &FolderPath::inbox(),
            &FilterConfig::new(),
            &config,
            &clock(),
        )
        .unwrap();

        let subjects: Vec<_> = messages
            .iter()
            .map(|m| mailbox.envelope(m).unwrap().subject)
            .collect();
        assert_eq!(subjects, ["SCART referral", "Rota", "Re: SCART referral"]);
        assert!(mailbox.applied_queries().is_empty());
    }

    #[test]
    fn test_date_window_and_sender() {
        let (mailbox, root) = mailbox();
        let config = Config::new("me@example.com");
        let filter = FilterConfig::new()
            .start("10/12/22")
            .stop("12/12/22 23:59")
            .from_email("moore@hotmail");

        let messages =
            get_emails(&mailbox, &root, &FolderPath::inbox(), &filter, &config, &clock()).unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(mailbox.envelope(&messages[0]).unwrap().subject, "Re: SCART referral");
        assert_eq!(
            mailbox.applied_queries(),
            [
                "[ReceivedTime] >= '2022-10-12 00:00 AM'",
                "[ReceivedTime] <= '2022-12-12 23:59 PM'",
                "@SQL=\"urn:schemas:httpmail:fromemail\" like '%moore@hotmail%'",
            ]
        );
    }

    #[test]
    fn test_inconsistent_filter_applies_nothing() {
        let (mailbox, root) = mailbox();
        let config = Config::new("me@example.com");
        let filter = FilterConfig::new().start("12/12/22").stop("10/12/22");

        let result = get_emails(&mailbox, &root, &FolderPath::inbox(), &filter, &config, &clock());
        assert!(matches!(result, Err(Error::FilterInconsistency(_))));
        assert!(mailbox.applied_queries().is_empty());
    }

    #[test]
    fn test_unique_properties() {
        let (mailbox, root) = mailbox();
        let inbox = find_folder(&mailbox, &root, &FolderPath::inbox()).unwrap();
        let messages = mailbox.collect(mailbox.items(&inbox).unwrap()).unwrap();

        let properties = unique_properties(&mailbox, &messages).unwrap();
        assert_eq!(
            properties.from_email.into_iter().collect::<Vec<_>>(),
            ["moore@hotmail.com", "office@church.org"]
        );
        assert_eq!(properties.from_name.len(), 2);
        assert_eq!(properties.subject.len(), 3);
    }

    #[test]
    fn test_find_sender_emails() {
        let (mailbox, root) = mailbox();
        let senders = find_sender_emails(&mailbox, &root, &FolderPath::inbox()).unwrap();
        assert_eq!(senders.len(), 2);
        assert!(senders.contains("office@church.org"));
    }

    #[test]
    fn test_plain_file_name() {
        assert_eq!(plain_file_name("report.pdf"), Some("report.pdf"));
        assert_eq!(plain_file_name("../../etc/passwd"), Some("passwd"));
        assert_eq!(plain_file_name("C:\\Users\\me\\scan.pdf"), Some("scan.pdf"));
        assert_eq!(plain_file_name(".."), None);
        assert_eq!(plain_file_name("dir/"), None);
    }

    #[test]
    fn test_unique_file_name_keeps_extension() {
        let name = unique_file_name("scan.final.PDF");
        assert!(name.ends_with(".PDF"));
        assert_ne!(name, unique_file_name("scan.final.PDF"));
        assert!(!unique_file_name("README").contains('.'));
    }

    #[test]
    fn test_download_skips_excluded_and_creates_dest() {
        let (mut mailbox, root) = mailbox();
        let inbox = find_folder(&mailbox, &root, &FolderPath::inbox()).unwrap();
        let id = mailbox.add_message(
            inbox,
            StoredMessage::new("photos", at(13, 9))
                .attachment("a.jpg", b"jpg".to_vec())
                .attachment("b.pdf", b"pdf".to_vec()),
        );

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let saved =
            download_attachments(&mailbox, &[id], &dest, &DownloadOptions::default()).unwrap();

        assert_eq!(saved, vec![dest.join("b.pdf")]);
        assert_eq!(std::fs::read(dest.join("b.pdf")).unwrap(), b"pdf");
        assert!(!dest.join("a.jpg").exists());
    }
}
