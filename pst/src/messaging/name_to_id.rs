//! The named property map.
//!
//! Properties with IDs from `0x8000` up are named: their meaning is a
//! (property set GUID, name) pair rather than a fixed ID. The map lives in
//! node `0x61` as three binary streams:
//!
//! ```text
//! 0x0002  GUID stream    16-byte GUIDs, referenced from index 3 up
//! 0x0003  entry stream   8-byte records, record i defines ID 0x8000 + i
//!                          u32  numeric name, or offset into the string stream
//!                          u16  bit 0: string name; bits 1..: GUID index
//!                          u16  property index
//! 0x0004  string stream  u32 byte length, then UTF-16LE name, per entry
//! ```
//!
//! GUID indexes 0, 1 and 2 stand for no GUID, `PS_MAPI` and
//! `PS_PUBLIC_STRINGS`.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::bytes::{bytes_at, u16_at, u32_at};
use crate::ltp::data_type::decode_unicode;
use crate::ltp::Guid;
use crate::messaging::error::PstError;
use crate::messaging::pst::PstFile;
use crate::messaging::tags;
use crate::ndb::ids::Nid;

/// First ID assigned to named properties.
pub const FIRST_NAMED_ID: u16 = 0x8000;

const ENTRY_SIZE: usize = 8;
const GUID_SIZE: usize = 16;
const FIRST_STREAM_GUID_INDEX: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyName {
    /// A numeric name (LID).
    Numeric(u32),
    String(String),
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(lid) => write!(f, "{lid:#06x}"),
            Self::String(name) => write!(f, "\"{name}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedProperty {
    pub guid: Guid,
    pub name: PropertyName,
}

#[derive(Debug, Clone, Default)]
pub struct NameToIdMap {
    entries: BTreeMap<u16, NamedProperty>,
}

impl NameToIdMap {
    pub(crate) fn open(pst: &PstFile) -> Result<Self, PstError> {
        let node = pst.node(Nid::NAME_TO_ID_MAP)?;
        let pc = pst.property_context(&node)?;
        let guids = pc
            .get_binary(tags::NAMEID_STREAM_GUID)?
            .ok_or(PstError::NameIdStreamNotFound("GUID"))?;
        let entries = pc
            .get_binary(tags::NAMEID_STREAM_ENTRY)?
            .ok_or(PstError::NameIdStreamNotFound("entry"))?;
        let strings = pc
            .get_binary(tags::NAMEID_STREAM_STRING)?
            .ok_or(PstError::NameIdStreamNotFound("string"))?;
        let map = Self::parse(&guids, &entries, &strings)?;
        debug!(entries = map.len(), "loaded name-to-ID map");
        Ok(map)
    }

    /// Build the map from its three streams.
    pub fn parse(guids: &[u8], entries: &[u8], strings: &[u8]) -> Result<Self, PstError> {
        if entries.len() % ENTRY_SIZE != 0 {
            return Err(PstError::IncorrectNameIdStreamContent(
                "entry stream length is not a multiple of 8",
            ));
        }
        if guids.len() % GUID_SIZE != 0 {
            return Err(PstError::IncorrectNameIdStreamContent(
                "GUID stream length is not a multiple of 16",
            ));
        }

        let mut map = BTreeMap::new();
        for record in entries.chunks_exact(ENTRY_SIZE) {
            let (Some(name_or_offset), Some(guid_field), Some(index)) =
                (u32_at(record, 0), u16_at(record, 4), u16_at(record, 6))
            else {
                return Err(PstError::IncorrectNameIdStreamContent("truncated entry"));
            };
            let id = FIRST_NAMED_ID.checked_add(index).ok_or(
                PstError::IncorrectNameIdStreamContent("property index past 0x7FFF"),
            )?;
            let guid = resolve_guid(guids, usize::from(guid_field >> 1))?;
            let name = if guid_field & 1 == 0 {
                PropertyName::Numeric(name_or_offset)
            } else {
                PropertyName::String(read_name(strings, name_or_offset)?)
            };
            map.insert(id, NamedProperty { guid, name });
        }
        Ok(Self { entries: map })
    }

    #[must_use]
    pub fn get(&self, id: u16) -> Option<&NamedProperty> {
        self.entries.get(&id)
    }

    /// The property ID assigned to `name` in property set `guid`.
    #[must_use]
    pub fn id_for(&self, guid: &Guid, name: &PropertyName) -> Option<u16> {
        self.entries
            .iter()
            .find(|(_, named)| named.guid == *guid && named.name == *name)
            .map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &NamedProperty)> {
        self.entries.iter().map(|(id, named)| (*id, named))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn resolve_guid(guids: &[u8], index: usize) -> Result<Guid, PstError> {
    match index {
        0 => Ok(Guid::default()),
        1 => Ok(Guid::PS_MAPI),
        2 => Ok(Guid::PS_PUBLIC_STRINGS),
        _ => {
            let offset = (index - FIRST_STREAM_GUID_INDEX) * GUID_SIZE;
            bytes_at(guids, offset, GUID_SIZE)
                .and_then(Guid::from_slice)
                .ok_or(PstError::IncorrectNameIdStreamContent(
                    "GUID index past the end of the GUID stream",
                ))
        }
    }
}

fn read_name(strings: &[u8], offset: u32) -> Result<String, PstError> {
    let offset = usize::try_from(offset).map_err(|_| {
        PstError::IncorrectNameIdStreamContent("string offset does not fit in memory")
    })?;
    let bytes = u32_at(strings, offset)
        .and_then(|len| usize::try_from(len).ok())
        .and_then(|len| bytes_at(strings, offset + 4, len))
        .ok_or(PstError::IncorrectNameIdStreamContent(
            "string name past the end of the string stream",
        ))?;
    Ok(decode_unicode(bytes))
}
