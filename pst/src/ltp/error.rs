//! Errors raised by the LTP layer.

use crate::ltp::data_type::PropertyType;
use crate::ltp::heap::{ClientSignature, Hid};
use crate::ndb::NdbError;
use crate::ndb::ids::Nid;

/// Errors that can occur while decoding heaps, BTHs, property contexts and
/// table contexts.
#[derive(Debug)]
pub enum LtpError {
    /// Failure in the node database beneath the heap.
    Ndb(NdbError),
    /// The first block does not carry the heap signature 0xEC.
    NotHeapNode { signature: u8 },
    /// The heap's client signature is not one of the known values.
    UnknownClientSignature(u8),
    /// A property context was expected.
    NotPropertyContext(ClientSignature),
    /// A table context was expected.
    NotTableContext(ClientSignature),
    /// A heap ID that does not address an allocation of this heap.
    InvalidHeapId(Hid),
    /// A B-tree-on-heap header or node could not be decoded.
    UnparseableBTreeOnHeap { hid: Hid, reason: &'static str },
    /// A property context's BTH has the wrong shape.
    UnparseablePropertyContext(&'static str),
    /// A table context's header, columns or rows could not be decoded.
    UnparseableTableContext(&'static str),
    /// A property type code with no known meaning.
    UnknownPropertyType(u16),
    /// A known property type that this reader does not decode.
    UnimplementedPropertyType(PropertyType),
    /// A value is shorter than its type requires, or its internal offsets
    /// point past its end.
    DataOverflow { needed: usize, available: usize },
    /// A value refers to a sub-node that the node does not have.
    SubnodeNotFound(Nid),
    /// A row index past the end of the table.
    RowOutOfRange { row: usize, rows: usize },
}

impl std::fmt::Display for LtpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ndb(e) => write!(f, "{e}"),
            Self::NotHeapNode { signature } => {
                write!(f, "not a heap node (signature 0x{signature:02x})")
            }
            Self::UnknownClientSignature(signature) => {
                write!(f, "unknown heap client signature 0x{signature:02x}")
            }
            Self::NotPropertyContext(found) => {
                write!(f, "not a property context node (client signature {found})")
            }
            Self::NotTableContext(found) => {
                write!(f, "not a table context node (client signature {found})")
            }
            Self::InvalidHeapId(hid) => write!(f, "invalid heap ID {hid}"),
            Self::UnparseableBTreeOnHeap { hid, reason } => {
                write!(f, "unparseable B-tree-on-heap at {hid}: {reason}")
            }
            Self::UnparseablePropertyContext(reason) => {
                write!(f, "unparseable property context: {reason}")
            }
            Self::UnparseableTableContext(reason) => {
                write!(f, "unparseable table context: {reason}")
            }
            Self::UnknownPropertyType(code) => write!(f, "unknown property type 0x{code:04x}"),
            Self::UnimplementedPropertyType(ptype) => {
                write!(f, "property type {} is not supported", ptype.name())
            }
            Self::DataOverflow { needed, available } => write!(
                f,
                "value needs {needed} bytes but only {available} are available"
            ),
            Self::SubnodeNotFound(nid) => write!(f, "sub-node {nid} not found"),
            Self::RowOutOfRange { row, rows } => {
                write!(f, "row {row} out of range (table has {rows} rows)")
            }
        }
    }
}

impl std::error::Error for LtpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ndb(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NdbError> for LtpError {
    fn from(e: NdbError) -> Self {
        Self::Ndb(e)
    }
}
