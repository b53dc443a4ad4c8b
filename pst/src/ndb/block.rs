//! Blocks: the unit of data storage.
//!
//! ```text
//! +---------------------------+-------+-----------------------+
//! | data (cb bytes)           | pad   | trailer               |
//! +---------------------------+-------+-----------------------+
//! |<-------- align(cb + trailer size, 64) ------------------->|
//!
//! trailer  ANSI:    cb u16, wSig u16, bid u32, dwCRC u32
//!          Unicode: cb u16, wSig u16, dwCRC u32, bid u64
//!          OST-2013: Unicode followed by 8 unused bytes
//! ```
//!
//! The trailer CRC covers the `cb` data bytes as stored. Data blocks are then
//! decrypted with the file's cipher; internal blocks (XBLOCK, XXBLOCK,
//! SLBLOCK, SIBLOCK) are never encrypted.
//!
//! Data larger than one block is chained through an XBLOCK listing the data
//! blocks in order, or an XXBLOCK listing XBLOCKs.

#![allow(clippy::cast_possible_truncation)]

use tracing::warn;

use crate::bytes::{u8_at, u16_at, u32_at, uint_at};
use crate::ndb::crc::compute_crc;
use crate::ndb::crypt::Encryption;
use crate::ndb::error::NdbError;
use crate::ndb::header::FileFormat;
use crate::ndb::ids::Bid;
use crate::ndb::page::BbtEntry;
use crate::ndb::source::Source;

/// `btype` of XBLOCK and XXBLOCK.
pub const BTYPE_XBLOCK: u8 = 0x01;
/// `btype` of SLBLOCK and SIBLOCK.
pub const BTYPE_SUBNODE: u8 = 0x02;

/// Size of the XBLOCK header: btype, cLevel, cEnt, lcbTotal.
const XBLOCK_HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTrailer {
    pub size: u16,
    pub signature: u16,
    pub crc: u32,
    pub bid: Bid,
}

impl BlockTrailer {
    fn parse(bytes: &[u8], format: FileFormat) -> Option<Self> {
        let size = u16_at(bytes, 0)?;
        let signature = u16_at(bytes, 2)?;
        let (crc, bid) = match format {
            FileFormat::Ansi => (u32_at(bytes, 8)?, uint_at(bytes, 4, 4)?),
            FileFormat::Unicode | FileFormat::Ost2013 => (u32_at(bytes, 4)?, uint_at(bytes, 8, 8)?),
        };
        Some(Self {
            size,
            signature,
            crc,
            bid: Bid::from_raw(bid),
        })
    }
}

/// Read one block's payload: CRC-checked and, for data blocks, decrypted.
pub fn read_block(
    source: &dyn Source,
    format: FileFormat,
    encryption: Encryption,
    entry: &BbtEntry,
    verify_crc: bool,
) -> Result<Vec<u8>, NdbError> {
    let bid = entry.bref.bid;
    if format == FileFormat::Ost2013 && entry.inflated_size != entry.size {
        return Err(NdbError::CompressedBlock {
            bid,
            stored: entry.size,
            inflated: entry.inflated_size,
        });
    }

    let data_len = usize::from(entry.size);
    let block_len = format.block_size(data_len);
    let mut block = source.read_vec(entry.bref.ib, block_len)?;
    let trailer_at = block_len - format.block_trailer_size();
    let trailer = BlockTrailer::parse(&block[trailer_at..], format).ok_or(
        NdbError::TruncatedBlock {
            bid,
            expected: block_len,
            found: block.len(),
        },
    )?;

    block.truncate(data_len);
    let computed = compute_crc(&block);
    if computed != trailer.crc {
        if verify_crc {
            return Err(NdbError::BlockCrcMismatch {
                bid,
                stored: trailer.crc,
                computed,
            });
        }
        warn!(%bid, stored = trailer.crc, computed, "block CRC mismatch ignored");
    }

    if !bid.is_internal() {
        encryption.decrypt(&mut block, bid.cipher_tweak());
    }
    Ok(block)
}

/// A decoded XBLOCK or XXBLOCK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XBlock {
    /// 1 for an XBLOCK (children are data blocks), 2 for an XXBLOCK.
    pub level: u8,
    /// Total byte count of the data the chain describes.
    pub total_size: u32,
    pub children: Vec<Bid>,
}

impl XBlock {
    /// Decode the internal block `bid`. Fails if it is not an XBLOCK.
    pub fn parse(bytes: &[u8], format: FileFormat, bid: Bid) -> Result<Self, NdbError> {
        let truncated = |expected| NdbError::TruncatedBlock {
            bid,
            expected,
            found: bytes.len(),
        };
        let btype = u8_at(bytes, 0).ok_or_else(|| truncated(XBLOCK_HEADER_SIZE))?;
        if btype != BTYPE_XBLOCK {
            return Err(NdbError::BadXBlockType { bid, btype });
        }
        let level = u8_at(bytes, 1).ok_or_else(|| truncated(XBLOCK_HEADER_SIZE))?;
        if !matches!(level, 1 | 2) {
            return Err(NdbError::BadXBlockLevel { bid, level });
        }
        let count = usize::from(u16_at(bytes, 2).ok_or_else(|| truncated(XBLOCK_HEADER_SIZE))?);
        let total_size = u32_at(bytes, 4).ok_or_else(|| truncated(XBLOCK_HEADER_SIZE))?;

        let id = format.id_size();
        let needed = XBLOCK_HEADER_SIZE + count * id;
        let children = (0..count)
            .map(|i| uint_at(bytes, XBLOCK_HEADER_SIZE + i * id, id).map(Bid::from_raw))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| truncated(needed))?;

        Ok(Self {
            level,
            total_size,
            children,
        })
    }
}
