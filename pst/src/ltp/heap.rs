//! Heap-on-node: variable-size allocations packed into a node's data blocks.
//!
//! ```text
//! block 0                                 block n > 0
//! +-------------------------------+       +---------------------------+
//! | HNHDR                         |       | HNPAGEHDR / HNBITMAPHDR   |
//! |   ibHnpm u16, bSig 0xEC,      |       |   ibHnpm u16, ...         |
//! |   bClientSig, hidUserRoot,    |       +---------------------------+
//! |   rgbFillLevel                |       | allocations               |
//! +-------------------------------+       +---------------------------+
//! | allocations                   |       | HNPAGEMAP                 |
//! +-------------------------------+       +---------------------------+
//! | HNPAGEMAP at ibHnpm           |
//! |   cAlloc u16, cFree u16,      |
//! |   rgibAlloc u16[cAlloc + 1]   |
//! +-------------------------------+
//! ```
//!
//! Every block starts with `ibHnpm`, so the page map is found the same way in
//! each. Allocation `i` (1-based) of a block spans
//! `rgibAlloc[i - 1]..rgibAlloc[i]`.

use std::fmt;

use crate::bytes::{bytes_at, u8_at, u16_at, u32_at};
use crate::ltp::error::LtpError;
use crate::ndb::database::{Ndb, NodeRef};
use crate::ndb::ids::{Bid, Nid};

/// `bSig` of every heap.
pub const HEAP_SIGNATURE: u8 = 0xEC;

/// Size of the HNHDR at the start of the first block.
const HEADER_SIZE: usize = 12;

/// Largest single allocation a heap block can hold.
pub const MAX_ALLOCATION_SIZE: usize = 3580;

/// Identifies what the heap stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSignature {
    TableContext,
    BTreeOnHeap,
    PropertyContext,
    /// A signature reserved by the format with no decoder here.
    Reserved(u8),
}

impl TryFrom<u8> for ClientSignature {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x7C => Ok(Self::TableContext),
            0xB5 => Ok(Self::BTreeOnHeap),
            0xBC => Ok(Self::PropertyContext),
            0x6C | 0x8C | 0x9C | 0xA5 | 0xAC | 0xCC => Ok(Self::Reserved(value)),
            _ => Err(value),
        }
    }
}

impl ClientSignature {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::TableContext => 0x7C,
            Self::BTreeOnHeap => 0xB5,
            Self::PropertyContext => 0xBC,
            Self::Reserved(value) => value,
        }
    }
}

impl fmt::Display for ClientSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.code())
    }
}

/// A heap ID: type bits (always 0), 1-based allocation index and block index.
///
/// ```text
/// +----------------+-----------+-------+
/// | block (16)     | index(11) | 0 (5) |
/// +----------------+-----------+-------+
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hid(u32);

impl Hid {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn new(block_index: u16, index: u16) -> Self {
        Self(((block_index as u32) << 16) | (((index as u32) & 0x7ff) << 5))
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// 1-based allocation index within the block.
    #[must_use]
    pub const fn index(self) -> usize {
        ((self.0 >> 5) & 0x7ff) as usize
    }

    #[must_use]
    pub const fn block_index(self) -> usize {
        (self.0 >> 16) as usize
    }
}

impl fmt::Debug for Hid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hid(block {}, #{})", self.block_index(), self.index())
    }
}

impl fmt::Display for Hid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Where a value lives: in this heap, in a sub-node, or nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hnid {
    Null,
    Heap(Hid),
    Subnode(Nid),
}

impl Hnid {
    /// A HID has zero in its type bits; anything else is a NID.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        if raw == 0 {
            Self::Null
        } else if raw & 0x1f == 0 {
            Self::Heap(Hid::from_raw(raw))
        } else {
            Self::Subnode(Nid::from_raw(raw))
        }
    }
}

/// A decoded heap over one node's data.
#[derive(Debug, Clone)]
pub struct HeapOnNode {
    blocks: Vec<Vec<u8>>,
    client_signature: ClientSignature,
    user_root: Hid,
}

impl HeapOnNode {
    /// Read a node's data blocks and decode its heap header.
    pub fn open(ndb: &Ndb, node: &NodeRef) -> Result<Self, LtpError> {
        let blocks = ndb.read_node_blocks(node)?;
        Self::from_blocks(blocks)
    }

    /// Decode a heap from its data blocks, in chain order.
    pub fn from_blocks(blocks: Vec<Vec<u8>>) -> Result<Self, LtpError> {
        let first = blocks.first().map(Vec::as_slice).unwrap_or_default();
        if first.len() < HEADER_SIZE {
            return Err(LtpError::NotHeapNode {
                signature: u8_at(first, 2).unwrap_or_default(),
            });
        }
        let signature = u8_at(first, 2).unwrap_or_default();
        if signature != HEAP_SIGNATURE {
            return Err(LtpError::NotHeapNode { signature });
        }
        let client = u8_at(first, 3).unwrap_or_default();
        let client_signature =
            ClientSignature::try_from(client).map_err(LtpError::UnknownClientSignature)?;
        let user_root = Hid::from_raw(u32_at(first, 4).unwrap_or_default());

        Ok(Self {
            blocks,
            client_signature,
            user_root,
        })
    }

    #[must_use]
    pub const fn client_signature(&self) -> ClientSignature {
        self.client_signature
    }

    /// The allocation holding the client's root structure.
    #[must_use]
    pub const fn user_root(&self) -> Hid {
        self.user_root
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The bytes of one allocation.
    pub fn get(&self, hid: Hid) -> Result<&[u8], LtpError> {
        let invalid = || LtpError::InvalidHeapId(hid);
        let index = hid.index();
        if index == 0 {
            return Err(invalid());
        }
        let block = self.blocks.get(hid.block_index()).ok_or_else(invalid)?;
        let map = usize::from(u16_at(block, 0).ok_or_else(invalid)?);
        let count = usize::from(u16_at(block, map).ok_or_else(invalid)?);
        if index > count {
            return Err(invalid());
        }
        let offsets = map + 4;
        let start = usize::from(u16_at(block, offsets + 2 * (index - 1)).ok_or_else(invalid)?);
        let end = usize::from(u16_at(block, offsets + 2 * index).ok_or_else(invalid)?);
        if start > end || end > map {
            return Err(invalid());
        }
        bytes_at(block, start, end - start).ok_or_else(invalid)
    }

    /// Resolve a value reference to its bytes. Sub-node references are
    /// looked up in the sub-node tree rooted at `subnodes`.
    pub fn read_hnid(&self, ndb: &Ndb, subnodes: Bid, hnid: Hnid) -> Result<Vec<u8>, LtpError> {
        match hnid {
            Hnid::Null => Ok(Vec::new()),
            Hnid::Heap(hid) => Ok(self.get(hid)?.to_vec()),
            Hnid::Subnode(nid) => {
                let entry = ndb
                    .subnodes(subnodes)
                    .find(nid)?
                    .ok_or(LtpError::SubnodeNotFound(nid))?;
                Ok(ndb.read_node_blocks(&NodeRef::from(entry))?.concat())
            }
        }
    }
}
