//! Generic read-only B-tree descent.
//!
//! Four on-disk structures share the same shape: the Node B-tree and Block
//! B-tree (paged), the sub-node tree (SLBLOCK/SIBLOCK) and the B-tree-on-heap.
//! Each node is either a leaf holding `(key, entry)` records or an
//! intermediate node holding `(key, child)` records, where a child's key is
//! the first key found beneath it.
//!
//! ```text
//!              [ 10 | 40 | 90 ]            level 1
//!               /      |      \
//!   [10 12 31]    [40 41 77]    [90 95]    level 0 (leaves)
//! ```
//!
//! A target is searched in the child whose key range covers it: the child's
//! key is an inclusive lower bound and the next child's key an exclusive upper
//! bound. A target below the first key of a node, or an empty node, is absent.
//!
//! Two access modes are provided and must agree on every lookup:
//! - [`Tree`] loads every node once ([`Tree::build`]) and answers lookups from
//!   memory.
//! - [`find`] loads only the nodes on the path to the target, holding a single
//!   node at a time.

use std::fmt;

/// Read access to one decoded node.
///
/// Indices passed to [`key`](Self::key), [`child`](Self::child) and
/// [`entry`](Self::entry) are always below [`len`](Self::len).
pub trait BTreeNode {
    type Key: Ord + Copy + fmt::Debug;
    /// Reference from an intermediate record to the node beneath it.
    type Child: Copy + fmt::Debug;
    /// Payload of a leaf record.
    type Entry: Clone;

    /// Distance from the leaves; 0 for a leaf.
    fn level(&self) -> u8;
    fn len(&self) -> usize;
    fn key(&self, index: usize) -> Self::Key;
    /// The child reference of an intermediate record, `None` on a leaf.
    fn child(&self, index: usize) -> Option<Self::Child>;
    /// The payload of a leaf record, `None` on an intermediate node.
    fn entry(&self, index: usize) -> Option<Self::Entry>;

    fn is_leaf(&self) -> bool {
        self.level() == 0
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the record whose range covers `target`: the last record with
    /// a key not greater than `target`.
    fn covering_index(&self, target: Self::Key) -> Option<usize> {
        partition_point(self.len(), |i| self.key(i) <= target).checked_sub(1)
    }

    /// Index of the record whose key is exactly `target`.
    fn exact_index(&self, target: Self::Key) -> Option<usize> {
        self.covering_index(target)
            .filter(|&index| self.key(index) == target)
    }
}

/// Loads nodes for a descent.
pub trait NodeLoader {
    type Node: BTreeNode;
    type Error;

    fn load_root(&self) -> Result<Self::Node, Self::Error>;

    /// Load the node behind `child`, failing if its level is not
    /// `expected_level`.
    fn load(
        &self,
        child: <Self::Node as BTreeNode>::Child,
        expected_level: u8,
    ) -> Result<Self::Node, Self::Error>;
}

type KeyOf<L> = <<L as NodeLoader>::Node as BTreeNode>::Key;
type EntryOf<L> = <<L as NodeLoader>::Node as BTreeNode>::Entry;

fn partition_point(len: usize, pred: impl Fn(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Look up `target` by loading only the nodes on its path.
///
/// Returns `Ok(None)` when the key is absent; errors are reserved for nodes
/// that cannot be loaded or decoded.
pub fn find<L: NodeLoader>(loader: &L, target: KeyOf<L>) -> Result<Option<EntryOf<L>>, L::Error> {
    let mut node = loader.load_root()?;
    loop {
        if node.is_leaf() {
            return Ok(node.exact_index(target).and_then(|i| node.entry(i)));
        }
        let Some(child) = node.covering_index(target).and_then(|i| node.child(i)) else {
            return Ok(None);
        };
        node = loader.load(child, node.level() - 1)?;
    }
}

/// Visit every leaf entry in key order, loading one path at a time.
pub fn for_each_entry<L, F>(loader: &L, mut visit: F) -> Result<(), L::Error>
where
    L: NodeLoader,
    F: FnMut(EntryOf<L>),
{
    let root = loader.load_root()?;
    walk(loader, &root, &mut visit)
}

fn walk<L, F>(loader: &L, node: &L::Node, visit: &mut F) -> Result<(), L::Error>
where
    L: NodeLoader,
    F: FnMut(EntryOf<L>),
{
    for index in 0..node.len() {
        if node.is_leaf() {
            if let Some(entry) = node.entry(index) {
                visit(entry);
            }
        } else if let Some(child) = node.child(index) {
            let child = loader.load(child, node.level() - 1)?;
            walk(loader, &child, visit)?;
        }
    }
    Ok(())
}

/// Collect every leaf entry in key order.
pub fn collect_entries<L: NodeLoader>(loader: &L) -> Result<Vec<EntryOf<L>>, L::Error> {
    let mut entries = Vec::new();
    for_each_entry(loader, |entry| entries.push(entry))?;
    Ok(entries)
}

/// A fully loaded B-tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree<K, E> {
    Leaf(Vec<(K, E)>),
    Branch { level: u8, children: Vec<(K, Tree<K, E>)> },
}

impl<K: Ord + Copy + fmt::Debug, E: Clone> Tree<K, E> {
    /// Load the whole tree reachable from the loader's root.
    pub fn build<L, N>(loader: &L) -> Result<Self, L::Error>
    where
        L: NodeLoader<Node = N>,
        N: BTreeNode<Key = K, Entry = E>,
    {
        let root = loader.load_root()?;
        Self::from_node(loader, &root)
    }

    fn from_node<L, N>(loader: &L, node: &N) -> Result<Self, L::Error>
    where
        L: NodeLoader<Node = N>,
        N: BTreeNode<Key = K, Entry = E>,
    {
        if node.is_leaf() {
            let entries = (0..node.len())
                .filter_map(|i| node.entry(i).map(|entry| (node.key(i), entry)))
                .collect();
            return Ok(Self::Leaf(entries));
        }

        let mut children = Vec::with_capacity(node.len());
        for i in 0..node.len() {
            if let Some(child) = node.child(i) {
                let loaded = loader.load(child, node.level() - 1)?;
                children.push((node.key(i), Self::from_node(loader, &loaded)?));
            }
        }
        Ok(Self::Branch {
            level: node.level(),
            children,
        })
    }

    /// Look up `target`. Agrees with [`find`] on the same on-disk tree.
    #[must_use]
    pub fn find(&self, target: K) -> Option<&E> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(entries) => {
                    let index = entries.partition_point(|(k, _)| *k <= target).checked_sub(1)?;
                    let (key, entry) = &entries[index];
                    return (*key == target).then_some(entry);
                }
                Self::Branch { children, .. } => {
                    let index = children.partition_point(|(k, _)| *k <= target).checked_sub(1)?;
                    node = &children[index].1;
                }
            }
        }
    }

    /// All leaf entries in key order.
    #[must_use]
    pub fn entries(&self) -> Vec<(K, &E)> {
        let mut out = Vec::new();
        self.push_entries(&mut out);
        out
    }

    fn push_entries<'a>(&'a self, out: &mut Vec<(K, &'a E)>) {
        match self {
            Self::Leaf(entries) => out.extend(entries.iter().map(|(k, e)| (*k, e))),
            Self::Branch { children, .. } => {
                for (_, child) in children {
                    child.push_entries(out);
                }
            }
        }
    }

    /// Number of leaf entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Leaf(entries) => entries.len(),
            Self::Branch { children, .. } => children.iter().map(|(_, c)| c.len()).sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of levels, counting the leaves.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch { children, .. } => {
                1 + children.first().map_or(0, |(_, child)| child.depth())
            }
        }
    }

    /// Smallest key stored beneath this node.
    #[must_use]
    pub fn first_key(&self) -> Option<K> {
        match self {
            Self::Leaf(entries) => entries.first().map(|(k, _)| *k),
            Self::Branch { children, .. } => children.first().map(|(k, _)| *k),
        }
    }

    /// Check the structural invariants: keys never decrease within a node,
    /// every intermediate record's key equals the first key of its child, and
    /// every child sits exactly one level below its parent.
    #[must_use]
    pub fn is_well_ordered(&self) -> bool {
        match self {
            Self::Leaf(entries) => entries.windows(2).all(|w| w[0].0 <= w[1].0),
            Self::Branch { level, children } => {
                children.windows(2).all(|w| w[0].0 <= w[1].0)
                    && children.iter().all(|(key, child)| {
                        let child_level = match child {
                            Self::Leaf(_) => 0,
                            Self::Branch { level, .. } => *level,
                        };
                        child_level + 1 == *level
                            && child.first_key().is_none_or(|first| first == *key)
                            && child.is_well_ordered()
                    })
            }
        }
    }
}
