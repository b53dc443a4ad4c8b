//! Test reading messages, their recipients and their attachments.

use crate::config::ReaderConfig;
use crate::e2e_tests::helpers::*;
use crate::messaging::{AttachMethod, AttachmentData, MessageKind, RecipientType};
use crate::ndb::crypt::Encryption;
use crate::ndb::header::FileFormat;
use crate::testing::{SampleMailbox, sample_mailbox};

#[test]
fn test_message_properties() {
    for format in [FileFormat::Ansi, FileFormat::Unicode] {
        let sample = sample_mailbox(format, Encryption::Permute);
        let pst = open(sample.bytes, ReaderConfig::default());

        let message = pst.message(SampleMailbox::REPORT).expect("message");
        assert_eq!(message.nid(), SampleMailbox::REPORT);
        assert_eq!(
            message.subject().expect("subject").as_deref(),
            Some("RE: Quarterly report")
        );
        assert_eq!(message.message_class().expect("class").as_deref(), Some("IPM.Note"));
        assert_eq!(message.kind().expect("kind"), MessageKind::Note);
        assert_eq!(message.body().expect("body").as_deref(), Some("Numbers attached."));
        assert_eq!(
            message.sender_name().expect("sender").as_deref(),
            Some("Alice Example")
        );
        assert_eq!(message.display_to().expect("to").as_deref(), Some("Bob Example"));
        assert_eq!(message.flags().expect("flags"), Some(1));
        assert!(message.has_attachments().expect("flag"));
        assert_eq!(message.html_body().expect("html"), None);
        assert_eq!(
            message
                .delivery_time()
                .expect("time")
                .map(|t| t.to_string()),
            Some("2023-11-14 22:13:20 UTC".to_string())
        );
    }
}

#[test]
fn test_recipients() {
    let sample = sample_mailbox(FileFormat::Unicode, Encryption::None);
    let pst = open(sample.bytes, ReaderConfig::default());

    let message = pst.message(SampleMailbox::REPORT).expect("message");
    let recipients = message.recipients().expect("recipients");
    assert!(recipients.is_complete());
    assert_eq!(recipients.items.len(), 2);

    let bob = &recipients.items[0];
    assert_eq!(bob.display_name.as_deref(), Some("Bob Example"));
    assert_eq!(bob.email_address.as_deref(), Some("bob@example.com"));
    assert_eq!(bob.address_type.as_deref(), Some("SMTP"));
    assert_eq!(bob.recipient_type, RecipientType::To);
    assert_eq!(recipients.items[1].recipient_type, RecipientType::Cc);
}

#[test]
fn test_binary_attachment() {
    let sample = sample_mailbox(FileFormat::Unicode, Encryption::Cyclic);
    let pst = open(sample.bytes, ReaderConfig::default());

    let message = pst.message(SampleMailbox::REPORT).expect("message");
    let table = message
        .attachment_table()
        .expect("lookup")
        .expect("attachment table");
    assert_eq!(table.row_count(), 2);

    let attachments = message.attachments().expect("attachments");
    assert_eq!(attachments.items.len(), 2);

    let pdf = &attachments.items[0];
    assert_eq!(pdf.nid(), SampleMailbox::PDF_ATTACHMENT);
    assert_eq!(pdf.method().expect("method"), AttachMethod::ByValue);
    assert_eq!(pdf.filename().expect("name").as_deref(), Some("report.pdf"));
    assert_eq!(pdf.extension().expect("ext").as_deref(), Some(".pdf"));
    assert_eq!(pdf.mime_type().expect("mime").as_deref(), Some("application/pdf"));
    assert_eq!(pdf.size().expect("size"), Some(5000));
    match pdf.data().expect("data") {
        Some(AttachmentData::Bytes(bytes)) => assert_eq!(bytes, SampleMailbox::pdf_bytes()),
        other => panic!("expected attachment bytes, got {other:?}"),
    }
}

#[test]
fn test_embedded_message_attachment() {
    let sample = sample_mailbox(FileFormat::Ansi, Encryption::Cyclic);
    let pst = open(sample.bytes, ReaderConfig::default());

    let message = pst.message(SampleMailbox::REPORT).expect("message");
    let attachments = message.attachments().expect("attachments");
    let embedded = &attachments.items[1];
    assert_eq!(embedded.method().expect("method"), AttachMethod::EmbeddedMessage);
    assert_eq!(embedded.filename().expect("name"), None);

    let Some(AttachmentData::Embedded(inner)) = embedded.data().expect("data") else {
        panic!("expected an embedded message");
    };
    assert_eq!(inner.nid(), SampleMailbox::EMBEDDED_MESSAGE);
    assert_eq!(inner.subject().expect("subject").as_deref(), Some("Original request"));
    assert_eq!(
        inner.body().expect("body").as_deref(),
        Some("Please send the numbers.")
    );
    assert!(inner.attachments().expect("attachments").items.is_empty());
}

#[test]
fn test_message_without_tables() {
    let sample = sample_mailbox(FileFormat::Unicode, Encryption::Permute);
    let pst = open(sample.bytes, ReaderConfig::default());

    let meeting = pst.message(SampleMailbox::MEETING).expect("message");
    assert_eq!(meeting.kind().expect("kind"), MessageKind::Appointment);
    assert!(meeting.attachment_table().expect("lookup").is_none());
    assert!(meeting.attachments().expect("attachments").items.is_empty());
    assert!(meeting.recipients().expect("recipients").items.is_empty());
    assert!(!meeting.has_attachments().expect("flag"));
    assert_eq!(meeting.body().expect("body"), None);
}

#[test]
fn test_summary_opens_message() {
    let sample = sample_mailbox(FileFormat::Unicode, Encryption::Permute);
    let pst = open(sample.bytes, ReaderConfig::default());

    let inbox = pst.folder(SampleMailbox::INBOX).expect("inbox");
    let contents = inbox.contents().expect("contents");
    let message = contents.items[0].open(&pst).expect("open");
    assert_eq!(message.subject().expect("subject"), contents.items[0].subject);
}
