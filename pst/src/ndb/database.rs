//! The node database: header, B-tree indexes and block access.
//!
//! [`Ndb`] owns the byte source and translates logical IDs to bytes:
//!
//! ```text
//! NID --Node B-tree--> (data BID, sub-node BID)
//! BID --Block B-tree--> BREF --read + CRC + decrypt--> bytes
//! ```
//!
//! Nothing is cached beyond the eagerly loaded B-trees; every read goes to
//! the source.

use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::ndb::block::{XBlock, read_block};
use crate::ndb::crypt::Encryption;
use crate::ndb::error::NdbError;
use crate::ndb::header::{FileFormat, Header};
use crate::ndb::ids::{Bid, Nid};
use crate::ndb::page::{BbtEntry, NbtEntry};
use crate::ndb::source::Source;
use crate::ndb::subnode::{SlEntry, SubnodeTree};
use crate::ndb::tree::{BlockBTree, NodeBTree, PagedBTreeFinder};

/// A node reference: where a node's data and sub-nodes live.
///
/// Both top-level nodes (from the Node B-tree) and sub-nodes (from an
/// SLBLOCK) resolve to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    pub nid: Nid,
    pub data: Bid,
    pub subnodes: Bid,
}

impl From<NbtEntry> for NodeRef {
    fn from(entry: NbtEntry) -> Self {
        Self {
            nid: entry.nid,
            data: entry.data,
            subnodes: entry.subnodes,
        }
    }
}

impl From<SlEntry> for NodeRef {
    fn from(entry: SlEntry) -> Self {
        Self {
            nid: entry.nid,
            data: entry.data,
            subnodes: entry.subnodes,
        }
    }
}

enum Index {
    Eager { nodes: NodeBTree, blocks: BlockBTree },
    Lazy,
}

/// An open file at the NDB level.
pub struct Ndb {
    source: Box<dyn Source>,
    header: Header,
    index: Index,
    verify_crc: bool,
}

impl Ndb {
    /// Read the header and, unless `lazy_btrees` is set, both B-trees.
    pub fn open(source: Box<dyn Source>, config: &ReaderConfig) -> Result<Self, NdbError> {
        let header = Header::read(source.as_ref(), config.verify_crc)?;
        let index = if config.lazy_btrees {
            Index::Lazy
        } else {
            let nodes = NodeBTree::build(
                source.as_ref(),
                header.format,
                header.node_btree_root,
                config.verify_crc,
            )?;
            let blocks = BlockBTree::build(
                source.as_ref(),
                header.format,
                header.block_btree_root,
                config.verify_crc,
            )?;
            Index::Eager { nodes, blocks }
        };
        debug!(
            format = %header.format,
            lazy = config.lazy_btrees,
            len = source.len(),
            "opened node database"
        );
        Ok(Self {
            source,
            header,
            index,
            verify_crc: config.verify_crc,
        })
    }

    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub const fn format(&self) -> FileFormat {
        self.header.format
    }

    #[must_use]
    pub const fn encryption(&self) -> Encryption {
        self.header.encryption
    }

    #[must_use]
    pub const fn verify_crc(&self) -> bool {
        self.verify_crc
    }

    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        matches!(self.index, Index::Lazy)
    }

    #[must_use]
    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }

    fn node_finder(&self) -> PagedBTreeFinder<'_, NbtEntry> {
        PagedBTreeFinder::new(
            self.source.as_ref(),
            self.header.format,
            self.header.node_btree_root,
            self.verify_crc,
        )
    }

    fn block_finder(&self) -> PagedBTreeFinder<'_, BbtEntry> {
        PagedBTreeFinder::new(
            self.source.as_ref(),
            self.header.format,
            self.header.block_btree_root,
            self.verify_crc,
        )
    }

    /// Look up a node in the Node B-tree.
    pub fn find_node(&self, nid: Nid) -> Result<Option<NbtEntry>, NdbError> {
        match &self.index {
            Index::Eager { nodes, .. } => Ok(nodes.node(nid).copied()),
            Index::Lazy => self.node_finder().node(nid),
        }
    }

    /// Look up a block in the Block B-tree.
    pub fn find_block(&self, bid: Bid) -> Result<Option<BbtEntry>, NdbError> {
        match &self.index {
            Index::Eager { blocks, .. } => Ok(blocks.block(bid).copied()),
            Index::Lazy => self.block_finder().block(bid),
        }
    }

    /// Every node in NID order.
    pub fn nodes(&self) -> Result<Vec<NbtEntry>, NdbError> {
        match &self.index {
            Index::Eager { nodes, .. } => Ok(nodes.entries().into_iter().copied().collect()),
            Index::Lazy => self.node_finder().entries(),
        }
    }

    /// Every block in BID order.
    pub fn blocks(&self) -> Result<Vec<BbtEntry>, NdbError> {
        match &self.index {
            Index::Eager { blocks, .. } => Ok(blocks.entries().into_iter().copied().collect()),
            Index::Lazy => self.block_finder().entries(),
        }
    }

    /// Read one block without following XBLOCK chains.
    pub fn read_single_block(&self, bid: Bid) -> Result<Vec<u8>, NdbError> {
        let entry = self.find_block(bid)?.ok_or(NdbError::BlockNotFound(bid))?;
        read_block(
            self.source.as_ref(),
            self.header.format,
            self.header.encryption,
            &entry,
            self.verify_crc,
        )
    }

    /// Read the data blocks making up `bid`, following XBLOCK and XXBLOCK
    /// chains. Each element is one data block's payload.
    pub fn read_data_blocks(&self, bid: Bid) -> Result<Vec<Vec<u8>>, NdbError> {
        let mut blocks = Vec::new();
        self.push_chain(bid, None, &mut blocks)?;
        Ok(blocks)
    }

    /// Read the data of `bid` as one contiguous buffer.
    pub fn read_data(&self, bid: Bid) -> Result<Vec<u8>, NdbError> {
        Ok(self.read_data_blocks(bid)?.concat())
    }

    /// Read a node's data blocks. Fails if the node has no data block.
    pub fn read_node_blocks(&self, node: &NodeRef) -> Result<Vec<Vec<u8>>, NdbError> {
        if node.data.is_null() {
            return Err(NdbError::NullDataBlock(node.nid));
        }
        self.read_data_blocks(node.data)
    }

    /// `level` is the level the block must have: `None` at the top of a
    /// chain, 0 for a data block, 1 for an XBLOCK.
    fn push_chain(&self, bid: Bid, level: Option<u8>, out: &mut Vec<Vec<u8>>) -> Result<(), NdbError> {
        if !bid.is_internal() {
            if level.is_some_and(|level| level != 0) {
                return Err(NdbError::BadXBlockLevel { bid, level: 0 });
            }
            out.push(self.read_single_block(bid)?);
            return Ok(());
        }

        let bytes = self.read_single_block(bid)?;
        let xblock = XBlock::parse(&bytes, self.header.format, bid)?;
        if level.is_some_and(|level| level != xblock.level) {
            return Err(NdbError::BadXBlockLevel {
                bid,
                level: xblock.level,
            });
        }

        let start = out.len();
        for &child in &xblock.children {
            self.push_chain(child, Some(xblock.level - 1), out)?;
        }
        let total: usize = out[start..].iter().map(Vec::len).sum();
        if total != xblock.total_size as usize {
            warn!(%bid, total, expected = xblock.total_size, "XBLOCK size mismatch");
        }
        Ok(())
    }

    /// The sub-node tree rooted at `root`.
    #[must_use]
    pub const fn subnodes(&self, root: Bid) -> SubnodeTree<'_> {
        SubnodeTree::new(self, root)
    }
}

impl std::fmt::Debug for Ndb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ndb")
            .field("header", &self.header)
            .field("lazy", &self.is_lazy())
            .field("verify_crc", &self.verify_crc)
            .finish_non_exhaustive()
    }
}
