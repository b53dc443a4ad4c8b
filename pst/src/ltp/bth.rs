//! B-tree-on-heap: a B-tree whose nodes are heap allocations.
//!
//! ```text
//! BTHHEADER (8 bytes)
//! +-------+-------+-------+------------+-----------+
//! | bType | cbKey | cbEnt | bIdxLevels | hidRoot   |
//! | 0xB5  | u8    | u8    | u8         | u32       |
//! +-------+-------+-------+------------+-----------+
//!
//! leaf node:          (key[cbKey], data[cbEnt])*
//! intermediate node:  (key[cbKey], hid u32)*
//! ```
//!
//! Nodes carry no level of their own; it follows from `bIdxLevels` and the
//! depth of the descent.

#![allow(clippy::cast_possible_truncation)]

use crate::bytes::{u8_at, u32_at, uint_at};
use crate::ltp::error::LtpError;
use crate::ltp::heap::{HeapOnNode, Hid};
use crate::ndb::btree::{self, BTreeNode, NodeLoader, Tree};

/// `bType` of a BTH header.
pub const BTH_SIGNATURE: u8 = 0xB5;

const HID_SIZE: usize = 4;

/// The decoded BTH header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BthHeader {
    pub key_size: usize,
    pub value_size: usize,
    /// Number of intermediate levels above the leaves.
    pub levels: u8,
    pub root: Hid,
}

impl BthHeader {
    fn parse(bytes: &[u8], hid: Hid) -> Result<Self, LtpError> {
        let unparseable = |reason| LtpError::UnparseableBTreeOnHeap { hid, reason };
        if bytes.len() < 8 {
            return Err(unparseable("header shorter than 8 bytes"));
        }
        if u8_at(bytes, 0) != Some(BTH_SIGNATURE) {
            return Err(unparseable("bad bType"));
        }
        let key_size = usize::from(u8_at(bytes, 1).unwrap_or_default());
        if !matches!(key_size, 2 | 4 | 8) {
            return Err(unparseable("unsupported key size"));
        }
        let value_size = usize::from(u8_at(bytes, 2).unwrap_or_default());
        if value_size == 0 || value_size > 32 {
            return Err(unparseable("unsupported value size"));
        }
        Ok(Self {
            key_size,
            value_size,
            levels: u8_at(bytes, 3).unwrap_or_default(),
            root: Hid::from_raw(u32_at(bytes, 4).unwrap_or_default()),
        })
    }
}

/// One leaf record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BthRecord {
    pub key: u64,
    pub data: Vec<u8>,
}

/// One decoded BTH node.
#[derive(Debug, Clone)]
pub struct BthNode {
    level: u8,
    keys: Vec<u64>,
    /// Leaf data, or the child HIDs of an intermediate node.
    values: Vec<Vec<u8>>,
}

impl BthNode {
    fn parse(bytes: &[u8], header: &BthHeader, level: u8, hid: Hid) -> Result<Self, LtpError> {
        let value_size = if level == 0 {
            header.value_size
        } else {
            HID_SIZE
        };
        let record = header.key_size + value_size;
        if bytes.len() % record != 0 {
            return Err(LtpError::UnparseableBTreeOnHeap {
                hid,
                reason: "node size is not a multiple of the record size",
            });
        }
        let mut keys = Vec::with_capacity(bytes.len() / record);
        let mut values = Vec::with_capacity(bytes.len() / record);
        for chunk in bytes.chunks_exact(record) {
            keys.push(uint_at(chunk, 0, header.key_size).unwrap_or_default());
            values.push(chunk[header.key_size..].to_vec());
        }
        Ok(Self {
            level,
            keys,
            values,
        })
    }
}

impl BTreeNode for BthNode {
    type Key = u64;
    type Child = Hid;
    type Entry = BthRecord;

    fn level(&self) -> u8 {
        self.level
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn key(&self, index: usize) -> u64 {
        self.keys[index]
    }

    fn child(&self, index: usize) -> Option<Hid> {
        if self.level == 0 {
            return None;
        }
        self.values
            .get(index)
            .and_then(|value| u32_at(value, 0))
            .map(Hid::from_raw)
    }

    fn entry(&self, index: usize) -> Option<BthRecord> {
        if self.level != 0 {
            return None;
        }
        Some(BthRecord {
            key: *self.keys.get(index)?,
            data: self.values.get(index)?.clone(),
        })
    }
}

/// A B-tree-on-heap bound to the heap that holds it.
#[derive(Debug, Clone, Copy)]
pub struct BTreeOnHeap<'h> {
    heap: &'h HeapOnNode,
    header: BthHeader,
}

impl<'h> BTreeOnHeap<'h> {
    /// Decode the BTH header stored in allocation `hid`.
    pub fn open(heap: &'h HeapOnNode, hid: Hid) -> Result<Self, LtpError> {
        let header = BthHeader::parse(heap.get(hid)?, hid)?;
        Ok(Self { heap, header })
    }

    #[must_use]
    pub const fn header(&self) -> &BthHeader {
        &self.header
    }

    #[must_use]
    pub const fn key_size(&self) -> usize {
        self.header.key_size
    }

    #[must_use]
    pub const fn value_size(&self) -> usize {
        self.header.value_size
    }

    /// Look up one key. `Ok(None)` if absent.
    pub fn find(&self, key: u64) -> Result<Option<Vec<u8>>, LtpError> {
        if self.header.root.is_null() {
            return Ok(None);
        }
        Ok(btree::find(self, key)?.map(|record| record.data))
    }

    /// Every record in key order.
    pub fn records(&self) -> Result<Vec<BthRecord>, LtpError> {
        if self.header.root.is_null() {
            return Ok(Vec::new());
        }
        btree::collect_entries(self)
    }

    /// Load the whole tree.
    pub fn build(&self) -> Result<Tree<u64, BthRecord>, LtpError> {
        if self.header.root.is_null() {
            return Ok(Tree::Leaf(Vec::new()));
        }
        Tree::build(self)
    }

    fn load_node(&self, hid: Hid, level: u8) -> Result<BthNode, LtpError> {
        BthNode::parse(self.heap.get(hid)?, &self.header, level, hid)
    }
}

impl NodeLoader for BTreeOnHeap<'_> {
    type Node = BthNode;
    type Error = LtpError;

    fn load_root(&self) -> Result<BthNode, LtpError> {
        self.load_node(self.header.root, self.header.levels)
    }

    fn load(&self, child: Hid, expected_level: u8) -> Result<BthNode, LtpError> {
        self.load_node(child, expected_level)
    }
}
