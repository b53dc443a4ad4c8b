//! Test that the same mailbox reads identically whatever its format,
//! cipher, B-tree depth, table layout or B-tree loading strategy.

use crate::config::ReaderConfig;
use crate::e2e_tests::helpers::*;
use crate::ndb::crypt::Encryption;
use crate::ndb::header::FileFormat;
use crate::testing::{MailboxBuilder, sample_mailbox};

fn reference() -> Vec<String> {
    let sample = sample_mailbox(FileFormat::Unicode, Encryption::None);
    describe(&open(sample.bytes, ReaderConfig::default()))
}

#[test]
fn test_every_format_and_cipher_reads_the_same() {
    let expected = reference();
    assert!(expected.len() > 5);
    for (format, encryption) in VARIANTS {
        let sample = sample_mailbox(format, encryption);
        let pst = open(sample.bytes, ReaderConfig::default());
        assert_eq!(pst.header().format, format);
        assert_eq!(pst.header().encryption, encryption);
        assert_eq!(describe(&pst), expected, "{format} {encryption:?}");
    }
}

#[test]
fn test_eager_and_lazy_btrees_agree() {
    let expected = reference();
    for (format, encryption) in VARIANTS {
        let sample = MailboxBuilder::new(format, encryption)
            .with_page_fanout(3)
            .build();
        let eager = open(sample.bytes.clone(), ReaderConfig::default());
        let lazy = open(sample.bytes, ReaderConfig::default().with_lazy_btrees(true));
        assert!(lazy.ndb().is_lazy());
        assert_eq!(describe(&eager), expected, "eager {format}");
        assert_eq!(describe(&lazy), expected, "lazy {format}");
    }
}

#[test]
fn test_row_matrix_in_subnode() {
    let expected = reference();
    for format in [FileFormat::Ansi, FileFormat::Unicode] {
        let sample = MailboxBuilder::new(format, Encryption::Permute)
            .with_rows_in_subnodes()
            .build();
        let pst = open(sample.bytes, ReaderConfig::default());
        assert_eq!(describe(&pst), expected, "{format}");
    }
}
