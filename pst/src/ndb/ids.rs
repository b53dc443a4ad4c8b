//! Node and block identifiers.
//!
//! ```text
//! NID (32 bits)
//! +-----------------------------+--------+
//! | index (27 bits)             | type   |
//! |                             | (5)    |
//! +-----------------------------+--------+
//!
//! BID (32 bits ANSI / 64 bits Unicode)
//! +------------------------------+---+---+
//! | index                        | I | r |
//! +------------------------------+---+---+
//!   I = internal (XBLOCK / SLBLOCK, never encrypted), r = reserved
//! ```

// NIDs are 32-bit by definition; the casts below only ever narrow masked values.
#![allow(clippy::cast_possible_truncation)]

use std::fmt;

/// The node type carried in the low five bits of a [`Nid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NidType {
    Hid,
    Internal,
    NormalFolder,
    SearchFolder,
    NormalMessage,
    Attachment,
    SearchUpdateQueue,
    SearchCriteriaObject,
    AssocMessage,
    ContentsTableIndex,
    ReceiveFolderTable,
    OutgoingQueueTable,
    HierarchyTable,
    ContentsTable,
    AssocContentsTable,
    SearchContentsTable,
    AttachmentTable,
    RecipientTable,
    SearchTableIndex,
    Ltp,
    /// A type value with no assigned meaning, kept verbatim.
    Unknown(u8),
}

impl NidType {
    /// Decode the five type bits. Never fails: unassigned values become `Unknown`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x1f {
            0x00 => Self::Hid,
            0x01 => Self::Internal,
            0x02 => Self::NormalFolder,
            0x03 => Self::SearchFolder,
            0x04 => Self::NormalMessage,
            0x05 => Self::Attachment,
            0x06 => Self::SearchUpdateQueue,
            0x07 => Self::SearchCriteriaObject,
            0x08 => Self::AssocMessage,
            0x0a => Self::ContentsTableIndex,
            0x0b => Self::ReceiveFolderTable,
            0x0c => Self::OutgoingQueueTable,
            0x0d => Self::HierarchyTable,
            0x0e => Self::ContentsTable,
            0x0f => Self::AssocContentsTable,
            0x10 => Self::SearchContentsTable,
            0x11 => Self::AttachmentTable,
            0x12 => Self::RecipientTable,
            0x13 => Self::SearchTableIndex,
            0x1f => Self::Ltp,
            other => Self::Unknown(other),
        }
    }

    /// The five type bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Hid => 0x00,
            Self::Internal => 0x01,
            Self::NormalFolder => 0x02,
            Self::SearchFolder => 0x03,
            Self::NormalMessage => 0x04,
            Self::Attachment => 0x05,
            Self::SearchUpdateQueue => 0x06,
            Self::SearchCriteriaObject => 0x07,
            Self::AssocMessage => 0x08,
            Self::ContentsTableIndex => 0x0a,
            Self::ReceiveFolderTable => 0x0b,
            Self::OutgoingQueueTable => 0x0c,
            Self::HierarchyTable => 0x0d,
            Self::ContentsTable => 0x0e,
            Self::AssocContentsTable => 0x0f,
            Self::SearchContentsTable => 0x10,
            Self::AttachmentTable => 0x11,
            Self::RecipientTable => 0x12,
            Self::SearchTableIndex => 0x13,
            Self::Ltp => 0x1f,
            Self::Unknown(bits) => bits & 0x1f,
        }
    }
}

/// A node identifier: the search key of the Node B-tree and of sub-node trees.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nid(u32);

impl Nid {
    /// The message store property context.
    pub const MESSAGE_STORE: Self = Self(0x21);
    /// The named property map.
    pub const NAME_TO_ID_MAP: Self = Self(0x61);
    /// The root folder of the folder hierarchy.
    pub const ROOT_FOLDER: Self = Self(0x122);

    /// Wrap a raw 32-bit NID.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Build a NID from its type and index. The index is truncated to 27 bits.
    #[must_use]
    pub const fn new(nid_type: NidType, index: u32) -> Self {
        Self(((index & 0x07ff_ffff) << 5) | nid_type.bits() as u32)
    }

    /// The raw 32-bit value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn nid_type(self) -> NidType {
        NidType::from_bits((self.0 & 0x1f) as u8)
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        (self.0 >> 5) & 0x07ff_ffff
    }

    /// The NID of a sibling node sharing this node's index, e.g. a folder's
    /// hierarchy table.
    #[must_use]
    pub const fn with_type(self, nid_type: NidType) -> Self {
        Self::new(nid_type, self.index())
    }
}

impl fmt::Debug for Nid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nid(0x{:08x} {:?}#{})", self.0, self.nid_type(), self.index())
    }
}

impl fmt::Display for Nid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// A block identifier. Stored widened to 64 bits for both file formats.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bid(u64);

impl Bid {
    const INTERNAL: u64 = 0x02;
    const RESERVED: u64 = 0x01;

    /// Wrap a raw BID value as read from the file.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The value used to search the Block B-tree (reserved bit cleared).
    #[must_use]
    pub const fn key(self) -> u64 {
        self.0 & !Self::RESERVED
    }

    /// Internal blocks hold NDB metadata and are never encrypted.
    #[must_use]
    pub const fn is_internal(self) -> bool {
        self.0 & Self::INTERNAL != 0
    }

    #[must_use]
    pub const fn is_null(self) -> bool {
        self.key() == 0
    }

    /// The tweak for the cyclic cipher: the low 32 bits of the key.
    #[must_use]
    pub const fn cipher_tweak(self) -> u32 {
        (self.key() & 0xffff_ffff) as u32
    }
}

impl fmt::Debug for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bid(0x{:x}{})", self.0, if self.is_internal() { " internal" } else { "" })
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// A block reference: a BID plus the absolute file offset (IB) of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bref {
    pub bid: Bid,
    pub ib: u64,
}

impl Bref {
    #[must_use]
    pub const fn new(bid: Bid, ib: u64) -> Self {
        Self { bid, ib }
    }
}
