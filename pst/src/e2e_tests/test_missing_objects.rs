//! Test that absent nodes and properties are reported, not guessed at.

use crate::config::ReaderConfig;
use crate::e2e_tests::helpers::*;
use crate::ltp::{PropertyTag, PropertyType};
use crate::messaging::PstError;
use crate::ndb::crypt::Encryption;
use crate::ndb::header::FileFormat;
use crate::ndb::ids::{Nid, NidType};
use crate::testing::{SampleMailbox, sample_mailbox};

#[test]
fn test_missing_message_node() {
    let pst = open(
        sample_mailbox(FileFormat::Unicode, Encryption::Permute).bytes,
        ReaderConfig::default(),
    );
    let nid = Nid::new(NidType::NormalMessage, 0x7777);
    assert!(matches!(pst.message(nid), Err(PstError::NodeNotFound(n)) if n == nid));
    assert!(pst.find_node(nid).expect("lookup").is_none());
}

#[test]
fn test_missing_folder_node() {
    let pst = open(
        sample_mailbox(FileFormat::Ansi, Encryption::None).bytes,
        ReaderConfig::default(),
    );
    let result = pst.folder(SampleMailbox::DANGLING_FOLDER);
    assert!(matches!(
        result,
        Err(PstError::NodeNotFound(n)) if n == SampleMailbox::DANGLING_FOLDER
    ));
}

#[test]
fn test_absent_properties_are_none() {
    let pst = open(
        sample_mailbox(FileFormat::Unicode, Encryption::Permute).bytes,
        ReaderConfig::default(),
    );
    let message = pst.message(SampleMailbox::MEETING).expect("message");
    assert_eq!(message.sender_name().expect("sender"), None);
    assert_eq!(message.transport_headers().expect("headers"), None);
    assert_eq!(message.submit_time().expect("time"), None);

    // Present, but asked for with the wrong type.
    let pc = message.property_context();
    assert_eq!(
        pc.get(PropertyTag::new(0x0037, PropertyType::Integer32)).expect("get"),
        None
    );
}

#[test]
fn test_missing_subnode() {
    let pst = open(
        sample_mailbox(FileFormat::Unicode, Encryption::Permute).bytes,
        ReaderConfig::default(),
    );
    let message = pst.message(SampleMailbox::REPORT).expect("message");
    let absent = Nid::new(NidType::Attachment, 0x7FF);
    assert!(pst.find_subnode(message.node(), absent).expect("lookup").is_none());
}
