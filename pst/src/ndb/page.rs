//! B-tree pages of the Node and Block B-trees.
//!
//! ```text
//! Unicode page (512 bytes)
//! +------------------------------+  0
//! | rgentries (488 bytes)        |
//! +------------------------------+  488
//! | cEnt cEntMax cbEnt cLevel    |
//! | dwPadding                    |
//! +------------------------------+  496
//! | ptype ptypeRepeat wSig       |
//! | dwCRC bid(u64)               |
//! +------------------------------+  512
//! ```
//!
//! ANSI pages have a 496-byte entry area, no padding and a 12-byte trailer
//! ordered `ptype ptypeRepeat wSig bid(u32) dwCRC`. OST-2013 pages are 4 KiB
//! with 16-bit entry counts. The CRC covers every byte before the trailer.
//! Pages are never encrypted.

#![allow(clippy::cast_possible_truncation)]

use std::fmt;

use tracing::warn;

use crate::bytes::{bytes_at, u8_at, u16_at, u32_at, uint_at};
use crate::ndb::btree::BTreeNode;
use crate::ndb::crc::compute_crc;
use crate::ndb::error::NdbError;
use crate::ndb::header::FileFormat;
use crate::ndb::ids::{Bid, Bref, Nid};
use crate::ndb::source::Source;

/// The `ptype` byte of a page trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PageType {
    BlockBTree = 0x80,
    NodeBTree = 0x81,
    FreeMap = 0x82,
    AllocationPageMap = 0x83,
    AllocationMap = 0x84,
    FreePageMap = 0x85,
    DensityList = 0x86,
}

impl TryFrom<u8> for PageType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x80 => Ok(Self::BlockBTree),
            0x81 => Ok(Self::NodeBTree),
            0x82 => Ok(Self::FreeMap),
            0x83 => Ok(Self::AllocationPageMap),
            0x84 => Ok(Self::AllocationMap),
            0x85 => Ok(Self::FreePageMap),
            0x86 => Ok(Self::DensityList),
            _ => Err(value),
        }
    }
}

/// The trailer found at the end of every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTrailer {
    pub ptype: u8,
    pub ptype_repeat: u8,
    pub signature: u16,
    pub crc: u32,
    pub bid: Bid,
}

impl PageTrailer {
    fn parse(page: &[u8], format: FileFormat) -> Option<Self> {
        let at = format.page_size() - format.page_trailer_size();
        let ptype = u8_at(page, at)?;
        let ptype_repeat = u8_at(page, at + 1)?;
        let signature = u16_at(page, at + 2)?;
        let (crc, bid) = match format {
            FileFormat::Ansi => (u32_at(page, at + 8)?, u64::from(u32_at(page, at + 4)?)),
            FileFormat::Unicode | FileFormat::Ost2013 => {
                (u32_at(page, at + 4)?, uint_at(page, at + 8, 8)?)
            }
        };
        Some(Self {
            ptype,
            ptype_repeat,
            signature,
            crc,
            bid: Bid::from_raw(bid),
        })
    }
}

/// An intermediate record: the first key of a child page and its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BtEntry {
    pub key: u64,
    pub bref: Bref,
}

impl BtEntry {
    #[must_use]
    pub const fn size(format: FileFormat) -> usize {
        format.id_size() + format.bref_size()
    }

    fn parse(bytes: &[u8], format: FileFormat) -> Option<Self> {
        let id = format.id_size();
        Some(Self {
            key: uint_at(bytes, 0, id)?,
            bref: parse_bref(bytes, id, format)?,
        })
    }
}

fn parse_bref(bytes: &[u8], offset: usize, format: FileFormat) -> Option<Bref> {
    let id = format.id_size();
    Some(Bref::new(
        Bid::from_raw(uint_at(bytes, offset, id)?),
        uint_at(bytes, offset + id, id)?,
    ))
}

/// A record stored in the leaves of a paged B-tree.
pub trait LeafEntry: Clone + fmt::Debug {
    /// The page type of every page in this entry's tree.
    const PAGE_TYPE: PageType;

    /// Smallest `cbEnt` able to hold the record.
    fn min_size(format: FileFormat) -> usize;

    fn parse(bytes: &[u8], format: FileFormat) -> Option<Self>;

    /// The search key.
    fn key(&self) -> u64;
}

/// A Block B-tree leaf record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BbtEntry {
    pub bref: Bref,
    /// Stored size of the block's data.
    pub size: u16,
    /// Size after inflation; equal to `size` except in compressed OST-2013 blocks.
    pub inflated_size: u16,
    pub ref_count: u16,
}

impl LeafEntry for BbtEntry {
    const PAGE_TYPE: PageType = PageType::BlockBTree;

    fn min_size(format: FileFormat) -> usize {
        match format {
            FileFormat::Ansi | FileFormat::Unicode => format.bref_size() + 4,
            FileFormat::Ost2013 => format.bref_size() + 6,
        }
    }

    fn parse(bytes: &[u8], format: FileFormat) -> Option<Self> {
        let at = format.bref_size();
        let size = u16_at(bytes, at)?;
        let (inflated_size, ref_count) = match format {
            FileFormat::Ost2013 => (u16_at(bytes, at + 2)?, u16_at(bytes, at + 4)?),
            FileFormat::Ansi | FileFormat::Unicode => (size, u16_at(bytes, at + 2)?),
        };
        Some(Self {
            bref: parse_bref(bytes, 0, format)?,
            size,
            inflated_size,
            ref_count,
        })
    }

    fn key(&self) -> u64 {
        self.bref.bid.key()
    }
}

/// A Node B-tree leaf record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NbtEntry {
    pub nid: Nid,
    pub data: Bid,
    /// Root of the node's sub-node tree; null when the node has none.
    pub subnodes: Bid,
    pub parent: Nid,
}

impl LeafEntry for NbtEntry {
    const PAGE_TYPE: PageType = PageType::NodeBTree;

    fn min_size(format: FileFormat) -> usize {
        3 * format.id_size() + 4
    }

    fn parse(bytes: &[u8], format: FileFormat) -> Option<Self> {
        let id = format.id_size();
        Some(Self {
            // NIDs are 32 bits; Unicode widens the key field to 64.
            nid: Nid::from_raw(u32_at(bytes, 0)?),
            data: Bid::from_raw(uint_at(bytes, id, id)?),
            subnodes: Bid::from_raw(uint_at(bytes, 2 * id, id)?),
            parent: Nid::from_raw(u32_at(bytes, 3 * id)?),
        })
    }

    fn key(&self) -> u64 {
        u64::from(self.nid.raw())
    }
}

/// Records held by a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageItems<E> {
    Branch(Vec<BtEntry>),
    Leaf(Vec<E>),
}

/// A decoded B-tree page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BTreePage<E> {
    /// File offset the page was read from.
    pub ib: u64,
    pub level: u8,
    pub entry_size: usize,
    pub max_entries: usize,
    pub trailer: PageTrailer,
    pub items: PageItems<E>,
}

impl<E: LeafEntry> BTreePage<E> {
    /// Read and decode the page referenced by `bref`.
    pub fn read(
        source: &dyn Source,
        format: FileFormat,
        bref: Bref,
        verify_crc: bool,
    ) -> Result<Self, NdbError> {
        let bytes = source.read_vec(bref.ib, format.page_size())?;
        Self::parse(&bytes, format, bref.ib, verify_crc)
    }

    /// Decode one page image. `ib` is only used in diagnostics.
    pub fn parse(
        page: &[u8],
        format: FileFormat,
        ib: u64,
        verify_crc: bool,
    ) -> Result<Self, NdbError> {
        let truncated = || NdbError::TruncatedBlock {
            bid: Bid::default(),
            expected: format.page_size(),
            found: page.len(),
        };
        let trailer = PageTrailer::parse(page, format).ok_or_else(truncated)?;

        let expected = E::PAGE_TYPE as u8;
        if trailer.ptype != expected || trailer.ptype_repeat != expected {
            let found = if trailer.ptype == expected {
                trailer.ptype_repeat
            } else {
                trailer.ptype
            };
            return Err(NdbError::BadPageType {
                ib,
                expected,
                found,
            });
        }

        let covered = bytes_at(page, 0, format.page_size() - format.page_trailer_size())
            .ok_or_else(truncated)?;
        let computed = compute_crc(covered);
        if computed != trailer.crc {
            if verify_crc {
                return Err(NdbError::PageCrcMismatch {
                    ib,
                    stored: trailer.crc,
                    computed,
                });
            }
            warn!(ib, stored = trailer.crc, computed, "page CRC mismatch ignored");
        }

        let meta = format.page_entry_area();
        let (count, max_entries, entry_size, level) = match format {
            FileFormat::Ost2013 => (
                usize::from(u16_at(page, meta).ok_or_else(truncated)?),
                usize::from(u16_at(page, meta + 2).ok_or_else(truncated)?),
                usize::from(u8_at(page, meta + 4).ok_or_else(truncated)?),
                u8_at(page, meta + 5).ok_or_else(truncated)?,
            ),
            FileFormat::Ansi | FileFormat::Unicode => (
                usize::from(u8_at(page, meta).ok_or_else(truncated)?),
                usize::from(u8_at(page, meta + 1).ok_or_else(truncated)?),
                usize::from(u8_at(page, meta + 2).ok_or_else(truncated)?),
                u8_at(page, meta + 3).ok_or_else(truncated)?,
            ),
        };

        let minimum = if level == 0 {
            E::min_size(format)
        } else {
            BtEntry::size(format)
        };
        if entry_size < minimum {
            return Err(NdbError::EntrySizeTooSmall {
                ib,
                entry_size,
                minimum,
            });
        }
        if count * entry_size > meta {
            return Err(NdbError::InconsistentEntryCount {
                ib,
                count,
                entry_size,
                capacity: meta,
            });
        }

        let records = page[..count * entry_size].chunks_exact(entry_size);
        let items = if level == 0 {
            let entries = records
                .map(|record| E::parse(record, format))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(truncated)?;
            PageItems::Leaf(entries)
        } else {
            let entries = records
                .map(|record| BtEntry::parse(record, format))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(truncated)?;
            PageItems::Branch(entries)
        };

        Ok(Self {
            ib,
            level,
            entry_size,
            max_entries,
            trailer,
            items,
        })
    }
}

impl<E: LeafEntry> BTreeNode for BTreePage<E> {
    type Key = u64;
    type Child = Bref;
    type Entry = E;

    fn level(&self) -> u8 {
        self.level
    }

    fn len(&self) -> usize {
        match &self.items {
            PageItems::Branch(entries) => entries.len(),
            PageItems::Leaf(entries) => entries.len(),
        }
    }

    fn key(&self, index: usize) -> u64 {
        match &self.items {
            PageItems::Branch(entries) => entries[index].key,
            PageItems::Leaf(entries) => entries[index].key(),
        }
    }

    fn child(&self, index: usize) -> Option<Bref> {
        match &self.items {
            PageItems::Branch(entries) => entries.get(index).map(|e| e.bref),
            PageItems::Leaf(_) => None,
        }
    }

    fn entry(&self, index: usize) -> Option<E> {
        match &self.items {
            PageItems::Branch(_) => None,
            PageItems::Leaf(entries) => entries.get(index).cloned(),
        }
    }
}
