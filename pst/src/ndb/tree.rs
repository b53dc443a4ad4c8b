//! The Node B-tree and Block B-tree.
//!
//! Both are paged B-trees rooted at a BREF from the header. They can be used
//! in two modes:
//! - [`PagedBTree`] reads every page up front and answers lookups from memory.
//! - [`PagedBTreeFinder`] keeps only the root reference and reads the pages on
//!   the path to each key, bounding memory use on large files.

use std::marker::PhantomData;

use tracing::debug;

use crate::ndb::btree::{self, NodeLoader, Tree};
use crate::ndb::error::NdbError;
use crate::ndb::header::FileFormat;
use crate::ndb::ids::{Bid, Bref, Nid};
use crate::ndb::page::{BTreePage, BbtEntry, LeafEntry, NbtEntry};
use crate::ndb::source::Source;

/// Reads pages of one paged tree.
pub struct PageLoader<'a, E> {
    source: &'a dyn Source,
    format: FileFormat,
    root: Bref,
    verify_crc: bool,
    entry: PhantomData<fn() -> E>,
}

impl<'a, E> PageLoader<'a, E> {
    #[must_use]
    pub fn new(source: &'a dyn Source, format: FileFormat, root: Bref, verify_crc: bool) -> Self {
        Self {
            source,
            format,
            root,
            verify_crc,
            entry: PhantomData,
        }
    }
}

impl<E: LeafEntry> NodeLoader for PageLoader<'_, E> {
    type Node = BTreePage<E>;
    type Error = NdbError;

    fn load_root(&self) -> Result<BTreePage<E>, NdbError> {
        BTreePage::read(self.source, self.format, self.root, self.verify_crc)
    }

    fn load(&self, child: Bref, expected_level: u8) -> Result<BTreePage<E>, NdbError> {
        let page = BTreePage::read(self.source, self.format, child, self.verify_crc)?;
        if page.level != expected_level {
            return Err(NdbError::UnexpectedPageLevel {
                ib: child.ib,
                expected: expected_level,
                found: page.level,
            });
        }
        Ok(page)
    }
}

/// A fully loaded paged B-tree.
#[derive(Debug, Clone)]
pub struct PagedBTree<E> {
    tree: Tree<u64, E>,
}

pub type NodeBTree = PagedBTree<NbtEntry>;
pub type BlockBTree = PagedBTree<BbtEntry>;

impl<E: LeafEntry> PagedBTree<E> {
    /// Read every page reachable from `root`.
    pub fn build(
        source: &dyn Source,
        format: FileFormat,
        root: Bref,
        verify_crc: bool,
    ) -> Result<Self, NdbError> {
        let loader = PageLoader::<E>::new(source, format, root, verify_crc);
        let tree = Tree::build(&loader)?;
        debug!(
            page_type = ?E::PAGE_TYPE,
            entries = tree.len(),
            depth = tree.depth(),
            "loaded paged B-tree"
        );
        Ok(Self { tree })
    }

    #[must_use]
    pub fn find(&self, key: u64) -> Option<&E> {
        self.tree.find(key)
    }

    /// Every leaf entry in key order.
    #[must_use]
    pub fn entries(&self) -> Vec<&E> {
        self.tree.entries().into_iter().map(|(_, e)| e).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    #[must_use]
    pub const fn tree(&self) -> &Tree<u64, E> {
        &self.tree
    }
}

impl NodeBTree {
    #[must_use]
    pub fn node(&self, nid: Nid) -> Option<&NbtEntry> {
        self.find(u64::from(nid.raw()))
    }
}

impl BlockBTree {
    #[must_use]
    pub fn block(&self, bid: Bid) -> Option<&BbtEntry> {
        self.find(bid.key())
    }
}

/// A paged B-tree searched on demand.
pub struct PagedBTreeFinder<'a, E> {
    loader: PageLoader<'a, E>,
}

impl<'a, E: LeafEntry> PagedBTreeFinder<'a, E> {
    #[must_use]
    pub fn new(source: &'a dyn Source, format: FileFormat, root: Bref, verify_crc: bool) -> Self {
        Self {
            loader: PageLoader::new(source, format, root, verify_crc),
        }
    }

    pub fn find(&self, key: u64) -> Result<Option<E>, NdbError> {
        btree::find(&self.loader, key)
    }

    /// Every leaf entry in key order.
    pub fn entries(&self) -> Result<Vec<E>, NdbError> {
        btree::collect_entries(&self.loader)
    }
}

impl PagedBTreeFinder<'_, NbtEntry> {
    pub fn node(&self, nid: Nid) -> Result<Option<NbtEntry>, NdbError> {
        self.find(u64::from(nid.raw()))
    }
}

impl PagedBTreeFinder<'_, BbtEntry> {
    pub fn block(&self, bid: Bid) -> Result<Option<BbtEntry>, NdbError> {
        self.find(bid.key())
    }
}
