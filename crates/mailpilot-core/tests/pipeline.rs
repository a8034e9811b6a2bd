//! Integration tests for the mail automation pipeline.
//!
//! These tests drive the in-memory backend end to end: locating folders,
//! filtering, downloading, moving and sending.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use mailpilot_core::client::memory::{
    FolderId, MemoryMailbox, MemoryOutbox, MessageId, StoredMessage,
};
use mailpilot_core::time::MockClock;
use mailpilot_core::{
    Config, DownloadOptions, Error, FilterConfig, FolderPath, Mailbox, OutgoingMessage,
    RetryPolicy, download_attachments, find_folder, get_emails, move_emails, open_account,
    send_email,
};

const ACCOUNT: &str = "me@example.com";

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 12, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn clock() -> MockClock {
    MockClock::at(at(31, 12, 0))
}

/// An account with `Inbox / Admin / Church` and a handful of messages in
/// `Inbox / Admin`.
struct Fixture {
    mailbox: MemoryMailbox,
    config: Config,
    admin: FolderId,
    church: FolderId,
    messages: Vec<MessageId>,
}

impl Fixture {
    fn new() -> Self {
        let mut mailbox = MemoryMailbox::new();
        let root = mailbox.add_account(ACCOUNT);
        let inbox = mailbox.add_folder(root, "Inbox");
        let admin = mailbox.add_folder(inbox, "Admin");
        let church = mailbox.add_folder(admin, "Church");

        let messages = vec![
            mailbox.add_message(
                admin,
                StoredMessage::new("SCART referral", at(10, 0, 0))
                    .sender("Gillian Moore", "moore@hotmail.com")
                    .body("Referral attached")
                    .attachment("a.jpg", b"jpeg".to_vec())
                    .attachment("b.pdf", b"pdf".to_vec()),
            ),
            mailbox.add_message(
                admin,
                StoredMessage::new("Rota for O'Brien", at(11, 14, 30))
                    .sender("Church Office", "office@church.org")
                    .cc("moore@hotmail.com"),
            ),
            mailbox.add_message(
                admin,
                StoredMessage::new("50% off", at(12, 23, 59))
                    .sender("Shop", "deals@shop.example")
                    .html_body("<p>sale</p>"),
            ),
            mailbox.add_message(
                admin,
                StoredMessage::new("Too late", at(13, 0, 0))
                    .sender("Gillian Moore", "moore@hotmail.com"),
            ),
        ];

        Self {
            mailbox,
            config: Config::new(ACCOUNT),
            admin,
            church,
            messages,
        }
    }

    fn root(&self) -> FolderId {
        open_account(&self.mailbox, &self.config).unwrap()
    }

    fn get(&self, filter: &FilterConfig) -> mailpilot_core::Result<Vec<MessageId>> {
        get_emails(
            &self.mailbox,
            &self.root(),
            &FolderPath::from(["Inbox", "Admin"]),
            filter,
            &self.config,
            &clock(),
        )
    }

    fn subjects(&self, messages: &[MessageId]) -> Vec<String> {
        messages
            .iter()
            .map(|m| self.mailbox.envelope(m).unwrap().subject)
            .collect()
    }
}

#[test]
fn test_locator_matches_manual_descent() {
    let fx = Fixture::new();
    let root = fx.root();

    let path = FolderPath::from(["Inbox", "Admin", "Church"]);
    let found = find_folder(&fx.mailbox, &root, &path).unwrap();

    let inbox = fx.mailbox.subfolder(&root, "Inbox").unwrap();
    let admin = fx.mailbox.subfolder(&inbox, "Admin").unwrap();
    assert_eq!(found, fx.mailbox.subfolder(&admin, "Church").unwrap());
    assert_eq!(found, fx.church);
}

#[test]
fn test_missing_segment_fails_whole_lookup() {
    let fx = Fixture::new();
    let result = find_folder(
        &fx.mailbox,
        &fx.root(),
        &FolderPath::from(["Inbox", "Missing", "Church"]),
    );
    assert!(matches!(result, Err(Error::FolderNotFound { .. })));
}

#[test]
fn test_empty_filter_returns_everything_in_order() {
    let fx = Fixture::new();
    let messages = fx.get(&FilterConfig::new()).unwrap();
    assert_eq!(messages, fx.messages);
}

#[test]
fn test_date_window_is_inclusive() {
    let fx = Fixture::new();
    let filter = FilterConfig::new().start("10/12/22").stop("12/12/22 23:59");
    let messages = fx.get(&filter).unwrap();
    assert_eq!(
        fx.subjects(&messages),
        ["SCART referral", "Rota for O'Brien", "50% off"]
    );
}

#[test]
fn test_restrictions_combine_with_and() {
    let fx = Fixture::new();
    let filter = FilterConfig::new()
        .start("10/12/22")
        .stop("12/12/22 23:59")
        .from_email("moore@hotmail");
    let messages = fx.get(&filter).unwrap();
    assert_eq!(fx.subjects(&messages), ["SCART referral"]);

    let queries = fx.mailbox.applied_queries();
    assert_eq!(queries.len(), 3);
    assert!(queries[0].starts_with("[ReceivedTime] >="));
    assert!(queries[1].starts_with("[ReceivedTime] <="));
    assert!(queries[2].contains("fromemail"));
}

#[test]
fn test_cc_filter_uses_cc_value() {
    let fx = Fixture::new();
    let messages = fx.get(&FilterConfig::new().cc_email("moore@hotmail")).unwrap();
    assert_eq!(fx.subjects(&messages), ["Rota for O'Brien"]);
}

#[test]
fn test_special_characters_match_literally() {
    let fx = Fixture::new();

    let messages = fx.get(&FilterConfig::new().subject("O'Brien")).unwrap();
    assert_eq!(fx.subjects(&messages), ["Rota for O'Brien"]);

    let messages = fx.get(&FilterConfig::new().subject("50%")).unwrap();
    assert_eq!(fx.subjects(&messages), ["50% off"]);
    assert_eq!(
        fx.mailbox.applied_queries().last().map(String::as_str),
        Some("@SQL=\"urn:schemas:httpmail:subject\" like '%50[%]%'")
    );
}

#[test]
fn test_has_attachment_false_equals_absent() {
    let fx = Fixture::new();
    let without_key = fx.get(&FilterConfig::new().from_name("Gillian")).unwrap();
    let with_false = fx
        .get(&FilterConfig::new().from_name("Gillian").has_attachment(false))
        .unwrap();
    assert_eq!(without_key, with_false);

    let with_true = fx
        .get(&FilterConfig::new().from_name("Gillian").has_attachment(true))
        .unwrap();
    assert_eq!(fx.subjects(&with_true), ["SCART referral"]);
}

#[test]
fn test_inconsistent_filter_is_rejected_before_querying() {
    let fx = Fixture::new();

    let reversed = FilterConfig::new().start("12/12/22").stop("10/12/22");
    assert!(matches!(fx.get(&reversed), Err(Error::FilterInconsistency(_))));

    let future = FilterConfig::new().start("1/1/2099");
    assert!(matches!(fx.get(&future), Err(Error::FilterInconsistency(_))));

    assert!(fx.mailbox.applied_queries().is_empty());
}

#[test]
fn test_unparseable_date_is_reported() {
    let fx = Fixture::new();
    let result = fx.get(&FilterConfig::new().start("next tuesday-ish"));
    assert!(matches!(result, Err(Error::Date(_))));
}

#[test]
fn test_filter_from_json() {
    let fx = Fixture::new();
    let filter: FilterConfig = serde_json::from_str(
        r#"{ "start": "10/12/22", "stop": "12/12/22 23:59", "body": "referral" }"#,
    )
    .unwrap();
    let messages = fx.get(&filter).unwrap();
    assert_eq!(fx.subjects(&messages), ["SCART referral"]);
}

#[test]
fn test_download_excludes_jpg_by_default() {
    let fx = Fixture::new();
    let dir = tempfile::tempdir().unwrap();

    let saved = download_attachments(
        &fx.mailbox,
        &fx.messages[..1],
        dir.path(),
        &DownloadOptions::default(),
    )
    .unwrap();

    assert_eq!(saved, vec![dir.path().join("b.pdf")]);
    assert_eq!(std::fs::read(dir.path().join("b.pdf")).unwrap(), b"pdf");
    assert!(!dir.path().join("a.jpg").exists());
}

#[test]
fn test_download_overwrites_existing_file() {
    let fx = Fixture::new();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.pdf"), b"stale").unwrap();

    download_attachments(&fx.mailbox, &fx.messages[..1], dir.path(), &DownloadOptions::default())
        .unwrap();
    assert_eq!(std::fs::read(dir.path().join("b.pdf")).unwrap(), b"pdf");
}

#[test]
fn test_download_rename_gives_distinct_names() {
    let mut fx = Fixture::new();
    let twin = fx.mailbox.add_message(
        fx.admin,
        StoredMessage::new("twin", at(10, 1, 0)).attachment("b.pdf", b"other".to_vec()),
    );
    let dir = tempfile::tempdir().unwrap();
    let options = DownloadOptions::keep_all().rename(true);

    let saved =
        download_attachments(&fx.mailbox, &[fx.messages[0], twin], dir.path(), &options).unwrap();

    assert_eq!(saved.len(), 3);
    let names: HashSet<_> = saved.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
    assert_eq!(names.len(), 3);
    assert!(saved.iter().all(|p| p.parent() == Some(dir.path())));
    assert_eq!(
        saved
            .iter()
            .filter(|p| p.extension().is_some_and(|e| e == "pdf"))
            .count(),
        2
    );
    assert!(saved.iter().all(|p| p.exists()));
}

#[test]
fn test_download_never_escapes_destination() {
    let mut fx = Fixture::new();
    let sneaky = fx.mailbox.add_message(
        fx.admin,
        StoredMessage::new("sneaky", at(10, 2, 0)).attachment("../../evil.pdf", b"x".to_vec()),
    );
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("inner");

    let saved =
        download_attachments(&fx.mailbox, &[sneaky], &dest, &DownloadOptions::keep_all()).unwrap();
    assert_eq!(saved, vec![dest.join("evil.pdf")]);
}

#[test]
fn test_move_after_filter() {
    let fx = Fixture::new();
    let root = fx.root();
    let referrals = fx.get(&FilterConfig::new().subject("referral")).unwrap();

    move_emails(&fx.mailbox, &root, &referrals, &FolderPath::from(["Inbox", "Admin", "Church"]))
        .unwrap();

    assert_eq!(fx.mailbox.messages_in(fx.church), referrals);
    assert_eq!(fx.mailbox.messages_in(fx.admin).len(), 3);
}

#[test]
fn test_move_to_missing_folder_moves_nothing() {
    let fx = Fixture::new();
    let result = move_emails(
        &fx.mailbox,
        &fx.root(),
        &fx.messages,
        &FolderPath::from(["Inbox", "Archive"]),
    );
    assert!(matches!(result, Err(Error::FolderNotFound { .. })));
    assert_eq!(fx.mailbox.messages_in(fx.admin), fx.messages);
}

fn write_files(dir: &Path, names: &[&str]) -> Vec<std::path::PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::write(&path, b"data").unwrap();
            path
        })
        .collect()
}

#[test]
fn test_send_never_converging() {
    let dir = tempfile::tempdir().unwrap();
    let outbox = MemoryOutbox::with_attach_limits([1; 5]);
    let clock = MockClock::new();
    let mut message = OutgoingMessage::new("office@church.org", "Rota").body("See attached");
    message.attachments = write_files(dir.path(), &["rota.pdf", "notes.pdf"]);

    let err = send_email(&outbox, &message, &RetryPolicy::default(), &clock).unwrap_err();

    assert!(matches!(
        err,
        Error::AttachmentFailure {
            attempts: 5,
            expected: 2,
            attached: 1
        }
    ));
    assert_eq!(outbox.composed(), 5);
    assert!(outbox.sent().is_empty());
    assert_eq!(clock.sleeps(), 4);
    assert_eq!(clock.offset(), Duration::from_secs(120));
}

#[test]
fn test_send_converges_on_second_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let outbox = MemoryOutbox::with_attach_limits([0]);
    let clock = MockClock::new();
    let mut message = OutgoingMessage::new("office@church.org", "Rota").body("See attached");
    message.attachments = write_files(dir.path(), &["rota.pdf"]);

    send_email(&outbox, &message, &RetryPolicy::new(5, Duration::ZERO), &clock).unwrap();

    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "office@church.org");
    assert_eq!(sent[0].attachments, message.attachments);
    assert_eq!(outbox.composed(), 2);
    assert_eq!(outbox.discarded(), 1);
}

#[test]
fn test_send_one_of_two_attached_then_converges() {
    let dir = tempfile::tempdir().unwrap();
    let outbox = MemoryOutbox::with_attach_limits([1]);
    let clock = MockClock::new();
    let mut message = OutgoingMessage::new("office@church.org", "Rota").body("See attached");
    message.attachments = write_files(dir.path(), &["rota.pdf", "notes.pdf"]);

    send_email(&outbox, &message, &RetryPolicy::default(), &clock).unwrap();

    assert_eq!(outbox.composed(), 2);
    assert_eq!(outbox.discarded(), 1);
    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].attachments, message.attachments);
    assert_eq!(clock.sleeps(), 1);
    assert_eq!(clock.offset(), Duration::from_secs(30));
}

#[test]
fn test_config_round_trip_drives_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut config = Config::new(ACCOUNT);
    config.send = RetryPolicy::new(2, Duration::ZERO);
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    loaded.validate().unwrap();

    let fx = Fixture::new();
    assert_eq!(open_account(&fx.mailbox, &loaded).unwrap(), fx.root());
}
