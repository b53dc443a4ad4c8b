//! The file header.
//!
//! The header occupies the first 512 (ANSI) or 564 (Unicode) bytes of the
//! file. It identifies the file format, the cipher applied to data blocks and
//! the roots of the two NDB B-trees.
//!
//! ```text
//! offset  field
//! 0       dwMagic "!BDN"
//! 4       dwCRCPartial   (CRC of 471 bytes from offset 8)
//! 8       wMagicClient
//! 10      wVer           (14/15 ANSI, >= 23 Unicode, 36 OST-2013)
//! 12      wVerClient
//! 14      bPlatformCreate, bPlatformAccess
//! ...     format specific: root (EOF, NBT/BBT BREFs), bCryptMethod,
//!         dwCRCFull (Unicode only, CRC of 516 bytes from offset 8)
//! ```

// Header fields are at most 64 bits wide and every offset fits in usize.
#![allow(clippy::cast_possible_truncation)]

use tracing::{debug, warn};

use crate::bytes::{bytes_at, u8_at, u16_at, u32_at, uint_at};
use crate::ndb::crc::compute_crc;
use crate::ndb::crypt::Encryption;
use crate::ndb::ids::{Bid, Bref};
use crate::ndb::source::{Source, SourceError};

/// Magic number at offset 0: "!BDN".
pub const MAGIC: [u8; 4] = *b"!BDN";

/// Bytes covered by the partial header CRC.
const CRC_PARTIAL_BYTES: usize = 471;
/// Bytes covered by the full header CRC (Unicode only).
const CRC_FULL_BYTES: usize = 516;
/// Both CRCs start right after `dwCRCPartial`.
const CRC_START: usize = 8;

pub const HEADER_SIZE_ANSI: usize = 512;
pub const HEADER_SIZE_UNICODE: usize = 564;

/// Fields shared by every format.
mod offsets {
    pub const MAGIC: usize = 0;
    pub const CRC_PARTIAL: usize = 4;
    pub const MAGIC_CLIENT: usize = 8;
    pub const VERSION: usize = 10;
    pub const CLIENT_VERSION: usize = 12;
    pub const PLATFORM_CREATE: usize = 14;
    pub const PLATFORM_ACCESS: usize = 15;
}

/// Format-specific field offsets.
struct Layout {
    next_bid: usize,
    file_eof: usize,
    nbt_root: usize,
    bbt_root: usize,
    amap_valid: usize,
    sentinel: usize,
    crypt_method: usize,
    crc_full: Option<usize>,
    size: usize,
}

const ANSI_LAYOUT: Layout = Layout {
    next_bid: 24,
    file_eof: 168,
    nbt_root: 184,
    bbt_root: 192,
    amap_valid: 200,
    sentinel: 460,
    crypt_method: 461,
    crc_full: None,
    size: HEADER_SIZE_ANSI,
};

const UNICODE_LAYOUT: Layout = Layout {
    next_bid: 516,
    file_eof: 184,
    nbt_root: 216,
    bbt_root: 232,
    amap_valid: 248,
    sentinel: 512,
    crypt_method: 513,
    crc_full: Some(524),
    size: HEADER_SIZE_UNICODE,
};

/// The on-disk format variant. Governs the width of every ID and the size of
/// pages, blocks and trailers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// 32-bit IDs and offsets, 8-bit strings.
    Ansi,
    /// 64-bit IDs and offsets.
    Unicode,
    /// Unicode layout with 4 KiB pages and 512-byte block alignment.
    Ost2013,
}

impl FileFormat {
    /// Classify a `wVer` value.
    pub fn from_version(version: u16) -> Result<Self, HeaderError> {
        match version {
            14 | 15 => Ok(Self::Ansi),
            36 => Ok(Self::Ost2013),
            v if v >= 23 => Ok(Self::Unicode),
            v => Err(HeaderError::UnknownFileFormatVersion(v)),
        }
    }

    /// A representative `wVer` for this format.
    #[must_use]
    pub const fn version(self) -> u16 {
        match self {
            Self::Ansi => 14,
            Self::Unicode => 23,
            Self::Ost2013 => 36,
        }
    }

    #[must_use]
    pub const fn is_unicode(self) -> bool {
        !matches!(self, Self::Ansi)
    }

    #[must_use]
    pub const fn header_size(self) -> usize {
        match self {
            Self::Ansi => HEADER_SIZE_ANSI,
            Self::Unicode | Self::Ost2013 => HEADER_SIZE_UNICODE,
        }
    }

    /// Width of a BID or IB.
    #[must_use]
    pub const fn id_size(self) -> usize {
        match self {
            Self::Ansi => 4,
            Self::Unicode | Self::Ost2013 => 8,
        }
    }

    #[must_use]
    pub const fn bref_size(self) -> usize {
        2 * self.id_size()
    }

    #[must_use]
    pub const fn page_size(self) -> usize {
        match self {
            Self::Ansi | Self::Unicode => 512,
            Self::Ost2013 => 4096,
        }
    }

    #[must_use]
    pub const fn page_trailer_size(self) -> usize {
        match self {
            Self::Ansi => 12,
            Self::Unicode => 16,
            Self::Ost2013 => 24,
        }
    }

    /// Bytes available for B-tree entries at the start of a page.
    #[must_use]
    pub const fn page_entry_area(self) -> usize {
        match self {
            Self::Ansi => 496,
            Self::Unicode => 488,
            Self::Ost2013 => 4056,
        }
    }

    /// Blocks are padded to a multiple of this size.
    #[must_use]
    pub const fn block_alignment(self) -> usize {
        match self {
            Self::Ansi | Self::Unicode => 64,
            Self::Ost2013 => 512,
        }
    }

    #[must_use]
    pub const fn block_trailer_size(self) -> usize {
        match self {
            Self::Ansi => 12,
            Self::Unicode => 16,
            Self::Ost2013 => 24,
        }
    }

    /// Largest on-disk block, trailer included.
    #[must_use]
    pub const fn max_block_size(self) -> usize {
        match self {
            Self::Ansi | Self::Unicode => 8192,
            Self::Ost2013 => 65535,
        }
    }

    /// Largest payload a single data block can carry.
    #[must_use]
    pub const fn max_block_data(self) -> usize {
        self.max_block_size() - self.block_trailer_size()
    }

    /// On-disk size of a block carrying `data_len` payload bytes.
    #[must_use]
    pub const fn block_size(self, data_len: usize) -> usize {
        let required = data_len + self.block_trailer_size();
        required.div_ceil(self.block_alignment()) * self.block_alignment()
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ansi => "ANSI",
            Self::Unicode => "Unicode",
            Self::Ost2013 => "OST-2013",
        }
    }

    const fn layout(self) -> &'static Layout {
        match self {
            Self::Ansi => &ANSI_LAYOUT,
            Self::Unicode | Self::Ost2013 => &UNICODE_LAYOUT,
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The decoded file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub format: FileFormat,
    /// Raw `wVer`.
    pub version: u16,
    pub client_version: u16,
    pub platform_create: u8,
    pub platform_access: u8,
    pub encryption: Encryption,
    /// Logical end of file recorded in the root structure.
    pub file_eof: u64,
    pub node_btree_root: Bref,
    pub block_btree_root: Bref,
    pub amap_valid: u8,
    pub sentinel: u8,
    /// Next BID the writer would allocate.
    pub next_bid: Bid,
    pub crc_partial: u32,
    pub crc_full: Option<u32>,
}

impl Header {
    /// Read and validate the header at the start of `source`.
    pub fn read(source: &dyn Source, verify_crc: bool) -> Result<Self, HeaderError> {
        let available = source.len().min(HEADER_SIZE_UNICODE as u64) as usize;
        let bytes = source.read_vec(0, available)?;
        Self::parse(&bytes, verify_crc)
    }

    /// Parse a header from the first bytes of a file.
    ///
    /// Checks run in file order: magic, partial CRC, version, then the
    /// format-specific fields and the full CRC. With `verify_crc` off a CRC
    /// mismatch is logged and ignored.
    pub fn parse(bytes: &[u8], verify_crc: bool) -> Result<Self, HeaderError> {
        if bytes_at(bytes, offsets::MAGIC, MAGIC.len()) != Some(&MAGIC[..]) {
            return Err(HeaderError::NotPstFile);
        }

        let crc_partial =
            u32_at(bytes, offsets::CRC_PARTIAL).ok_or(HeaderError::Truncated(bytes.len()))?;
        let partial_region = bytes_at(bytes, CRC_START, CRC_PARTIAL_BYTES)
            .ok_or(HeaderError::Truncated(bytes.len()))?;
        check_crc("dwCRCPartial", crc_partial, partial_region, verify_crc)?;

        let truncated = || HeaderError::Truncated(bytes.len());
        let version = u16_at(bytes, offsets::VERSION).ok_or_else(truncated)?;
        let format = FileFormat::from_version(version)?;
        let layout = format.layout();
        if bytes.len() < layout.size {
            return Err(truncated());
        }

        let crc_full = match layout.crc_full {
            Some(offset) => {
                let stored = u32_at(bytes, offset).ok_or_else(truncated)?;
                let region = bytes_at(bytes, CRC_START, CRC_FULL_BYTES).ok_or_else(truncated)?;
                check_crc("dwCRCFull", stored, region, verify_crc)?;
                Some(stored)
            }
            None => None,
        };

        let id = format.id_size();
        let read_id = |offset: usize| uint_at(bytes, offset, id).ok_or_else(truncated);
        let read_bref = |offset: usize| -> Result<Bref, HeaderError> {
            Ok(Bref::new(Bid::from_raw(read_id(offset)?), read_id(offset + id)?))
        };

        let crypt_method = u8_at(bytes, layout.crypt_method).ok_or_else(truncated)?;
        let encryption = Encryption::try_from(crypt_method)
            .map_err(HeaderError::UnknownEncryptionMethod)?;

        let header = Self {
            format,
            version,
            client_version: u16_at(bytes, offsets::CLIENT_VERSION).ok_or_else(truncated)?,
            platform_create: u8_at(bytes, offsets::PLATFORM_CREATE).ok_or_else(truncated)?,
            platform_access: u8_at(bytes, offsets::PLATFORM_ACCESS).ok_or_else(truncated)?,
            encryption,
            file_eof: read_id(layout.file_eof)?,
            node_btree_root: read_bref(layout.nbt_root)?,
            block_btree_root: read_bref(layout.bbt_root)?,
            amap_valid: u8_at(bytes, layout.amap_valid).ok_or_else(truncated)?,
            sentinel: u8_at(bytes, layout.sentinel).ok_or_else(truncated)?,
            next_bid: Bid::from_raw(read_id(layout.next_bid)?),
            crc_partial,
            crc_full,
        };

        let magic_client = u16_at(bytes, offsets::MAGIC_CLIENT).unwrap_or_default();
        debug!(
            format = %header.format,
            version,
            magic_client,
            encryption = header.encryption.name(),
            nbt_root = %header.node_btree_root.bid,
            bbt_root = %header.block_btree_root.bid,
            "parsed header"
        );
        Ok(header)
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "format {}, encryption {}, BBT BID {} IB 0x{:x}, NBT BID {} IB 0x{:x}",
            self.format,
            self.encryption.name(),
            self.block_btree_root.bid,
            self.block_btree_root.ib,
            self.node_btree_root.bid,
            self.node_btree_root.ib,
        )
    }
}

fn check_crc(
    field: &'static str,
    stored: u32,
    region: &[u8],
    verify_crc: bool,
) -> Result<(), HeaderError> {
    let computed = compute_crc(region);
    if computed == stored {
        return Ok(());
    }
    if verify_crc {
        return Err(HeaderError::CrcMismatch {
            field,
            stored,
            computed,
        });
    }
    warn!(field, stored, computed, "header CRC mismatch ignored");
    Ok(())
}

/// Errors raised while reading the header.
#[derive(Debug)]
pub enum HeaderError {
    /// Failure reading the underlying bytes.
    Source(SourceError),
    /// The magic number is not "!BDN".
    NotPstFile,
    /// `wVer` is neither ANSI nor Unicode.
    UnknownFileFormatVersion(u16),
    /// `bCryptMethod` is not one of the three known ciphers.
    UnknownEncryptionMethod(u8),
    /// A header CRC does not match the bytes it covers.
    CrcMismatch {
        field: &'static str,
        stored: u32,
        computed: u32,
    },
    /// Fewer bytes than the header needs (the available length is carried).
    Truncated(usize),
}

impl std::fmt::Display for HeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(e) => write!(f, "failed to read header: {e}"),
            Self::NotPstFile => write!(f, "not a PST file (bad magic number)"),
            Self::UnknownFileFormatVersion(v) => write!(f, "unknown file format version {v}"),
            Self::UnknownEncryptionMethod(m) => write!(f, "unknown encryption method {m}"),
            Self::CrcMismatch {
                field,
                stored,
                computed,
            } => write!(
                f,
                "header CRC mismatch in {field}: stored 0x{stored:08x}, computed 0x{computed:08x}"
            ),
            Self::Truncated(len) => write!(f, "header truncated: only {len} bytes available"),
        }
    }
}

impl std::error::Error for HeaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SourceError> for HeaderError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}
