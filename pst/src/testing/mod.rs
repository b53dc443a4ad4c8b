//! Builders for synthetic PST images used by the tests.
//!
//! Everything here writes the on-disk structures the readers decode, so
//! tests can assemble files of any format and encryption in memory.

mod ltp;
mod mailbox;

pub use ltp::{
    HeapWriter, PcProperty, TcRow, encode_multi_value, encode_unicode, property_context,
    table_context, write_bth,
};
pub use mailbox::{
    MailboxBuilder, SAMPLE_PROPERTY_SET, SampleMailbox, sample_mailbox, write_temp_file,
};
pub use ndb::{
    FixtureBuilder, PageRecord, SubnodeRecord, write_block, write_header, write_page,
    write_subnode_block, write_xblock,
};
