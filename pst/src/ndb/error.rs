//! Errors raised by the node database layer.

use crate::ndb::header::HeaderError;
use crate::ndb::ids::{Bid, Nid};
use crate::ndb::source::SourceError;

/// Errors that can occur while reading pages, blocks and sub-node trees.
#[derive(Debug)]
pub enum NdbError {
    /// Failure reading the underlying bytes.
    Source(SourceError),
    /// The file header could not be read.
    Header(HeaderError),
    /// A page's trailer CRC does not match its contents.
    PageCrcMismatch { ib: u64, stored: u32, computed: u32 },
    /// A block's trailer CRC does not match its stored bytes.
    BlockCrcMismatch { bid: Bid, stored: u32, computed: u32 },
    /// A page was not of the kind its tree requires.
    BadPageType { ib: u64, expected: u8, found: u8 },
    /// A page claims more entries than its entry area can hold.
    InconsistentEntryCount {
        ib: u64,
        count: usize,
        entry_size: usize,
        capacity: usize,
    },
    /// A page's entry width is too small for the records of its tree.
    EntrySizeTooSmall {
        ib: u64,
        entry_size: usize,
        minimum: usize,
    },
    /// A child page is not exactly one level below its parent.
    UnexpectedPageLevel { ib: u64, expected: u8, found: u8 },
    /// A BID has no entry in the Block B-tree.
    BlockNotFound(Bid),
    /// A node that must carry data has a null data BID.
    NullDataBlock(Nid),
    /// An internal block where a chain was expected has the wrong type byte.
    BadXBlockType { bid: Bid, btype: u8 },
    /// An XBLOCK level other than 1 or 2, or a child XBLOCK at the wrong level.
    BadXBlockLevel { bid: Bid, level: u8 },
    /// A block or one of its structures is shorter than it claims.
    TruncatedBlock { bid: Bid, expected: usize, found: usize },
    /// The block is stored compressed (OST-2013), which is not supported.
    CompressedBlock { bid: Bid, stored: u16, inflated: u16 },
    /// A sub-node block is neither an SLBLOCK nor an SIBLOCK.
    BadSubnodeBlock { bid: Bid, btype: u8, level: u8 },
}

impl std::fmt::Display for NdbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(e) => write!(f, "read error: {e}"),
            Self::Header(e) => write!(f, "header error: {e}"),
            Self::PageCrcMismatch {
                ib,
                stored,
                computed,
            } => write!(
                f,
                "page CRC mismatch at offset 0x{ib:x}: stored 0x{stored:08x}, computed 0x{computed:08x}"
            ),
            Self::BlockCrcMismatch {
                bid,
                stored,
                computed,
            } => write!(
                f,
                "block CRC mismatch for BID {bid}: stored 0x{stored:08x}, computed 0x{computed:08x}"
            ),
            Self::BadPageType {
                ib,
                expected,
                found,
            } => write!(
                f,
                "bad page type at offset 0x{ib:x}: expected 0x{expected:02x}, found 0x{found:02x}"
            ),
            Self::InconsistentEntryCount {
                ib,
                count,
                entry_size,
                capacity,
            } => write!(
                f,
                "page at offset 0x{ib:x} claims {count} entries of {entry_size} bytes but holds only {capacity} bytes"
            ),
            Self::EntrySizeTooSmall {
                ib,
                entry_size,
                minimum,
            } => write!(
                f,
                "page at offset 0x{ib:x} has entry size {entry_size}, minimum is {minimum}"
            ),
            Self::UnexpectedPageLevel {
                ib,
                expected,
                found,
            } => write!(
                f,
                "page at offset 0x{ib:x} is at level {found}, expected {expected}"
            ),
            Self::BlockNotFound(bid) => write!(f, "block {bid} not found"),
            Self::NullDataBlock(nid) => write!(f, "node {nid} has no data block"),
            Self::BadXBlockType { bid, btype } => {
                write!(f, "block {bid} has type 0x{btype:02x}, expected an XBLOCK")
            }
            Self::BadXBlockLevel { bid, level } => {
                write!(f, "XBLOCK {bid} has unexpected level {level}")
            }
            Self::TruncatedBlock {
                bid,
                expected,
                found,
            } => write!(
                f,
                "block {bid} truncated: expected {expected} bytes, found {found}"
            ),
            Self::CompressedBlock {
                bid,
                stored,
                inflated,
            } => write!(
                f,
                "block {bid} is compressed ({stored} bytes inflating to {inflated})"
            ),
            Self::BadSubnodeBlock { bid, btype, level } => write!(
                f,
                "block {bid} is not a sub-node block (type 0x{btype:02x}, level {level})"
            ),
        }
    }
}

impl std::error::Error for NdbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            Self::Header(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SourceError> for NdbError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

impl From<HeaderError> for NdbError {
    fn from(e: HeaderError) -> Self {
        Self::Header(e)
    }
}
