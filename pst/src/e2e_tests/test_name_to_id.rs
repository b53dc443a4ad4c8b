//! Test resolving named properties through the name-to-ID map.

use crate::config::ReaderConfig;
use crate::e2e_tests::helpers::*;
use crate::ltp::{Guid, PropertyValue};
use crate::messaging::{PropertyName, PstError};
use crate::ndb::crypt::Encryption;
use crate::ndb::header::FileFormat;
use crate::testing::{MailboxBuilder, SAMPLE_PROPERTY_SET, SampleMailbox, sample_mailbox};

#[test]
fn test_named_properties_resolve() {
    for format in [FileFormat::Ansi, FileFormat::Unicode] {
        let pst = open(sample_mailbox(format, Encryption::Permute).bytes, ReaderConfig::default());
        let map = pst.name_to_id_map().expect("map");
        assert_eq!(map.len(), 2);

        let numeric = map.get(0x8000).expect("0x8000 defined");
        assert_eq!(numeric.guid, SAMPLE_PROPERTY_SET);
        assert_eq!(numeric.name, PropertyName::Numeric(0x8501));

        let keywords = PropertyName::String("Keywords".to_string());
        assert_eq!(map.id_for(&Guid::PS_PUBLIC_STRINGS, &keywords), Some(0x8001));
        assert_eq!(map.id_for(&Guid::PS_MAPI, &keywords), None);
    }
}

#[test]
fn test_message_named_property_value() {
    let pst = open(
        sample_mailbox(FileFormat::Unicode, Encryption::Cyclic).bytes,
        ReaderConfig::default(),
    );
    let map = pst.name_to_id_map().expect("map");
    let id = map
        .id_for(&SAMPLE_PROPERTY_SET, &PropertyName::Numeric(0x8501))
        .expect("named property");

    let message = pst.message(SampleMailbox::REPORT).expect("message");
    let (_, value) = message
        .property_context()
        .get_by_id(id)
        .expect("get")
        .expect("present");
    assert_eq!(value, PropertyValue::Integer32(42));
}

#[test]
fn test_missing_map_node() {
    let bytes = MailboxBuilder::new(FileFormat::Unicode, Encryption::None)
        .without_name_to_id_map()
        .build()
        .bytes;
    let pst = open(bytes, ReaderConfig::default());
    assert!(matches!(
        pst.name_to_id_map(),
        Err(PstError::NodeNotFound(_))
    ));
}
