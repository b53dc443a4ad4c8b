//! Test the store password check.

use crate::config::ReaderConfig;
use crate::e2e_tests::helpers::*;
use crate::ndb::crypt::Encryption;
use crate::ndb::header::FileFormat;
use crate::testing::{MailboxBuilder, SampleMailbox, sample_mailbox};

#[test]
fn test_password_protected_store() {
    let bytes = MailboxBuilder::new(FileFormat::Unicode, Encryption::Permute)
        .with_password()
        .build()
        .bytes;
    let pst = open(bytes, ReaderConfig::default());
    let store = pst.message_store().expect("store");

    assert!(store.has_password().expect("flag"));
    assert!(store.check_password(SampleMailbox::PASSWORD).expect("check"));
    assert!(!store.check_password("letmein").expect("check"));
    assert!(!store.check_password("").expect("check"));
}

#[test]
fn test_unprotected_store_accepts_any_password() {
    let pst = open(
        sample_mailbox(FileFormat::Ansi, Encryption::None).bytes,
        ReaderConfig::default(),
    );
    let store = pst.message_store().expect("store");
    assert!(!store.has_password().expect("flag"));
    assert!(store.check_password("anything").expect("check"));
}
