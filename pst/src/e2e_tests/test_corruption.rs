//! Test CRC verification and damaged headers.

use crate::config::ReaderConfig;
use crate::e2e_tests::helpers::*;
use crate::messaging::{PstError, PstFile};
use crate::ndb::crypt::Encryption;
use crate::ndb::header::{FileFormat, HeaderError};
use crate::ndb::NdbError;
use crate::testing::{SampleMailbox, sample_mailbox};

#[test]
fn test_block_crc_mismatch_is_detected() {
    for format in [FileFormat::Ansi, FileFormat::Unicode] {
        let mut bytes = sample_mailbox(format, Encryption::Permute).bytes;
        corrupt_block_crc(&mut bytes, SampleMailbox::REPORT);
        let pst = open(bytes, ReaderConfig::default());

        let error = pst.message(SampleMailbox::REPORT).expect_err("CRC mismatch");
        assert!(is_block_crc_mismatch(&error), "{format}: {error}");

        // Other nodes are unaffected.
        assert!(pst.message(SampleMailbox::MEETING).is_ok());
    }
}

#[test]
fn test_crc_mismatch_tolerated_without_verification() {
    let mut bytes = sample_mailbox(FileFormat::Unicode, Encryption::Cyclic).bytes;
    corrupt_block_crc(&mut bytes, SampleMailbox::REPORT);
    let pst = open(bytes, ReaderConfig::default().with_verify_crc(false));

    let message = pst.message(SampleMailbox::REPORT).expect("message");
    assert_eq!(
        message.subject().expect("subject").as_deref(),
        Some("RE: Quarterly report")
    );
}

#[test]
fn test_not_a_pst_file() {
    let mut bytes = sample_mailbox(FileFormat::Unicode, Encryption::None).bytes;
    bytes[0] = b'X';
    let result = PstFile::from_bytes(bytes, ReaderConfig::default());
    assert!(matches!(
        result,
        Err(PstError::Ndb(NdbError::Header(HeaderError::NotPstFile)))
    ));
}

#[test]
fn test_header_crc_mismatch() {
    for format in [FileFormat::Ansi, FileFormat::Unicode] {
        let mut bytes = sample_mailbox(format, Encryption::None).bytes;
        // wVerClient, covered by both header CRCs.
        bytes[12] ^= 0x01;

        let strict = PstFile::from_bytes(bytes.clone(), ReaderConfig::default());
        assert!(
            matches!(
                strict,
                Err(PstError::Ndb(NdbError::Header(HeaderError::CrcMismatch { .. })))
            ),
            "{format}"
        );

        let tolerant = PstFile::from_bytes(bytes, ReaderConfig::default().with_verify_crc(false))
            .expect("open without verification");
        assert!(tolerant.message_store().is_ok());
    }
}

#[test]
fn test_truncated_file() {
    let mut bytes = sample_mailbox(FileFormat::Unicode, Encryption::None).bytes;
    bytes.truncate(100);
    assert!(PstFile::from_bytes(bytes, ReaderConfig::default()).is_err());
}
