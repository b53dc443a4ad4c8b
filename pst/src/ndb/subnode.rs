//! Sub-node trees.
//!
//! A node may own private child nodes (a message's attachments, a table's
//! row data, ...). They are indexed by a small B-tree made of internal blocks:
//!
//! ```text
//! SIBLOCK (cLevel 1)          SLBLOCK (cLevel 0)
//! btype 0x02, cLevel, cEnt    btype 0x02, cLevel, cEnt
//! [dwPadding, Unicode only]   [dwPadding, Unicode only]
//! SIENTRY { nid, bid }*       SLENTRY { nid, bidData, bidSub }*
//! ```
//!
//! IDs are 4 bytes wide in ANSI files and 8 bytes in Unicode files.

#![allow(clippy::cast_possible_truncation)]

use crate::bytes::{u8_at, u16_at, u32_at, uint_at};
use crate::ndb::block::BTYPE_SUBNODE;
use crate::ndb::btree::{self, BTreeNode, NodeLoader, Tree};
use crate::ndb::database::Ndb;
use crate::ndb::error::NdbError;
use crate::ndb::header::FileFormat;
use crate::ndb::ids::{Bid, Nid};

/// A sub-node: a leaf record of an SLBLOCK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlEntry {
    pub nid: Nid,
    pub data: Bid,
    pub subnodes: Bid,
}

/// An SIBLOCK record pointing at a lower-level sub-node block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiEntry {
    pub nid: Nid,
    pub bid: Bid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubnodeItems {
    Leaf(Vec<SlEntry>),
    Branch(Vec<SiEntry>),
}

/// One decoded SLBLOCK or SIBLOCK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnodeBlock {
    pub bid: Bid,
    pub level: u8,
    pub items: SubnodeItems,
}

const fn header_size(format: FileFormat) -> usize {
    match format {
        FileFormat::Ansi => 4,
        FileFormat::Unicode | FileFormat::Ost2013 => 8,
    }
}

impl SubnodeBlock {
    pub fn parse(bytes: &[u8], format: FileFormat, bid: Bid) -> Result<Self, NdbError> {
        let header = header_size(format);
        let truncated = |expected| NdbError::TruncatedBlock {
            bid,
            expected,
            found: bytes.len(),
        };
        let btype = u8_at(bytes, 0).ok_or_else(|| truncated(header))?;
        let level = u8_at(bytes, 1).ok_or_else(|| truncated(header))?;
        let count = usize::from(u16_at(bytes, 2).ok_or_else(|| truncated(header))?);
        if btype != BTYPE_SUBNODE || level > 1 {
            return Err(NdbError::BadSubnodeBlock { bid, btype, level });
        }

        let id = format.id_size();
        let items = if level == 0 {
            let size = 3 * id;
            let entries = (0..count)
                .map(|i| {
                    let at = header + i * size;
                    Some(SlEntry {
                        nid: Nid::from_raw(u32_at(bytes, at)?),
                        data: Bid::from_raw(uint_at(bytes, at + id, id)?),
                        subnodes: Bid::from_raw(uint_at(bytes, at + 2 * id, id)?),
                    })
                })
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| truncated(header + count * size))?;
            SubnodeItems::Leaf(entries)
        } else {
            let size = 2 * id;
            let entries = (0..count)
                .map(|i| {
                    let at = header + i * size;
                    Some(SiEntry {
                        nid: Nid::from_raw(u32_at(bytes, at)?),
                        bid: Bid::from_raw(uint_at(bytes, at + id, id)?),
                    })
                })
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| truncated(header + count * size))?;
            SubnodeItems::Branch(entries)
        };

        Ok(Self { bid, level, items })
    }
}

impl BTreeNode for SubnodeBlock {
    type Key = u32;
    type Child = Bid;
    type Entry = SlEntry;

    fn level(&self) -> u8 {
        self.level
    }

    fn len(&self) -> usize {
        match &self.items {
            SubnodeItems::Leaf(entries) => entries.len(),
            SubnodeItems::Branch(entries) => entries.len(),
        }
    }

    fn key(&self, index: usize) -> u32 {
        match &self.items {
            SubnodeItems::Leaf(entries) => entries[index].nid.raw(),
            SubnodeItems::Branch(entries) => entries[index].nid.raw(),
        }
    }

    fn child(&self, index: usize) -> Option<Bid> {
        match &self.items {
            SubnodeItems::Leaf(_) => None,
            SubnodeItems::Branch(entries) => entries.get(index).map(|e| e.bid),
        }
    }

    fn entry(&self, index: usize) -> Option<SlEntry> {
        match &self.items {
            SubnodeItems::Leaf(entries) => entries.get(index).copied(),
            SubnodeItems::Branch(_) => None,
        }
    }
}

/// The sub-node tree rooted at one node's sub-node BID.
#[derive(Clone, Copy)]
pub struct SubnodeTree<'a> {
    ndb: &'a Ndb,
    root: Bid,
}

impl<'a> SubnodeTree<'a> {
    #[must_use]
    pub const fn new(ndb: &'a Ndb, root: Bid) -> Self {
        Self { ndb, root }
    }

    #[must_use]
    pub const fn root(&self) -> Bid {
        self.root
    }

    /// Look up a sub-node. A node without sub-nodes (null root) has none.
    pub fn find(&self, nid: Nid) -> Result<Option<SlEntry>, NdbError> {
        if self.root.is_null() {
            return Ok(None);
        }
        btree::find(self, nid.raw())
    }

    /// Every sub-node in NID order.
    pub fn entries(&self) -> Result<Vec<SlEntry>, NdbError> {
        if self.root.is_null() {
            return Ok(Vec::new());
        }
        btree::collect_entries(self)
    }

    /// Load the whole tree.
    pub fn build(&self) -> Result<Tree<u32, SlEntry>, NdbError> {
        if self.root.is_null() {
            return Ok(Tree::Leaf(Vec::new()));
        }
        Tree::build(self)
    }

    fn load_block(&self, bid: Bid) -> Result<SubnodeBlock, NdbError> {
        let bytes = self.ndb.read_single_block(bid)?;
        SubnodeBlock::parse(&bytes, self.ndb.format(), bid)
    }
}

impl NodeLoader for SubnodeTree<'_> {
    type Node = SubnodeBlock;
    type Error = NdbError;

    fn load_root(&self) -> Result<SubnodeBlock, NdbError> {
        self.load_block(self.root)
    }

    fn load(&self, child: Bid, expected_level: u8) -> Result<SubnodeBlock, NdbError> {
        let block = self.load_block(child)?;
        if block.level != expected_level {
            return Err(NdbError::BadSubnodeBlock {
                bid: child,
                btype: BTYPE_SUBNODE,
                level: block.level,
            });
        }
        Ok(block)
    }
}
