//! Property context: a node's properties keyed by property ID.
//!
//! A PC is a heap whose user root is a BTH with 2-byte keys (the property
//! ID) and 6-byte records:
//!
//! ```text
//! +------------+----------------------+
//! | wPropType  | dwValueHnid          |
//! | u16        | u32                  |
//! +------------+----------------------+
//! ```
//!
//! Values of fixed-size types up to 4 bytes sit in `dwValueHnid` itself.
//! Everything else is an HNID: a heap allocation, or a sub-node for values
//! too large for the heap.

#![allow(clippy::cast_possible_truncation)]

use tracing::debug;

use crate::bytes::{bytes_at, u16_at, u32_at};
use crate::ltp::bth::{BTreeOnHeap, BthRecord};
use crate::ltp::data_type::{FileTime, PropertyType, PropertyValue, decode_inline, decode_value};
use crate::ltp::error::LtpError;
use crate::ltp::heap::{ClientSignature, HeapOnNode, Hnid};
use crate::ltp::tag::PropertyTag;
use crate::ndb::database::{Ndb, NodeRef};

const KEY_SIZE: usize = 2;
const RECORD_SIZE: usize = 6;

/// An opened property context.
#[derive(Debug)]
pub struct PropertyContext<'a> {
    ndb: &'a Ndb,
    node: NodeRef,
    heap: HeapOnNode,
}

impl<'a> PropertyContext<'a> {
    pub fn open(ndb: &'a Ndb, node: &NodeRef) -> Result<Self, LtpError> {
        let heap = HeapOnNode::open(ndb, node)?;
        let pc = Self::from_heap(ndb, *node, heap)?;
        debug!(nid = %node.nid, "opened property context");
        Ok(pc)
    }

    fn from_heap(ndb: &'a Ndb, node: NodeRef, heap: HeapOnNode) -> Result<Self, LtpError> {
        if heap.client_signature() != ClientSignature::PropertyContext {
            return Err(LtpError::NotPropertyContext(heap.client_signature()));
        }
        let bth = BTreeOnHeap::open(&heap, heap.user_root())?;
        if bth.key_size() != KEY_SIZE {
            return Err(LtpError::UnparseablePropertyContext("BTH key size is not 2"));
        }
        if bth.value_size() != RECORD_SIZE {
            return Err(LtpError::UnparseablePropertyContext("BTH record size is not 6"));
        }
        Ok(Self { ndb, node, heap })
    }

    #[must_use]
    pub const fn node(&self) -> &NodeRef {
        &self.node
    }

    fn bth(&self) -> Result<BTreeOnHeap<'_>, LtpError> {
        BTreeOnHeap::open(&self.heap, self.heap.user_root())
    }

    /// The stored value of property `tag`.
    ///
    /// `Ok(None)` when the property is absent or stored with a different
    /// type. String8 and String are interchangeable.
    pub fn get(&self, tag: PropertyTag) -> Result<Option<PropertyValue>, LtpError> {
        let Some(record) = self.bth()?.find(u64::from(tag.id()))? else {
            return Ok(None);
        };
        let stored = Self::record_tag(tag.id(), &record);
        if !stored.matches(tag) {
            return Ok(None);
        }
        self.decode_record(stored, &record).map(Some)
    }

    /// The value of property `id` with whatever type it was stored as.
    pub fn get_by_id(&self, id: u16) -> Result<Option<(PropertyTag, PropertyValue)>, LtpError> {
        let Some(record) = self.bth()?.find(u64::from(id))? else {
            return Ok(None);
        };
        let tag = Self::record_tag(id, &record);
        Ok(Some((tag, self.decode_record(tag, &record)?)))
    }

    /// Every property in ID order.
    pub fn properties(&self) -> Result<Vec<(PropertyTag, PropertyValue)>, LtpError> {
        self.bth()?
            .records()?
            .into_iter()
            .map(|BthRecord { key, data }| {
                let tag = Self::record_tag(key as u16, &data);
                Ok((tag, self.decode_record(tag, &data)?))
            })
            .collect()
    }

    /// Every stored tag in ID order, without decoding the values.
    pub fn tags(&self) -> Result<Vec<PropertyTag>, LtpError> {
        Ok(self
            .bth()?
            .records()?
            .iter()
            .map(|record| Self::record_tag(record.key as u16, &record.data))
            .collect())
    }

    fn record_tag(id: u16, record: &[u8]) -> PropertyTag {
        PropertyTag::from_raw((u32::from(id) << 16) | u32::from(u16_at(record, 0).unwrap_or_default()))
    }

    fn decode_record(&self, tag: PropertyTag, record: &[u8]) -> Result<PropertyValue, LtpError> {
        let ptype = tag.property_type().map_err(LtpError::UnknownPropertyType)?;
        let slot = bytes_at(record, 2, 4).ok_or(LtpError::UnparseablePropertyContext(
            "record shorter than 6 bytes",
        ))?;
        if ptype.is_inline_in_property_context() {
            return decode_inline(ptype, slot);
        }
        let hnid = Hnid::from_raw(u32_at(slot, 0).unwrap_or_default());
        let bytes = self.heap.read_hnid(self.ndb, self.node.subnodes, hnid)?;
        decode_value(ptype, &bytes)
    }

    pub fn get_string(&self, id: u16) -> Result<Option<String>, LtpError> {
        Ok(match self.get(PropertyTag::new(id, PropertyType::String))? {
            Some(PropertyValue::String(s)) => Some(s),
            _ => None,
        })
    }

    pub fn get_i32(&self, id: u16) -> Result<Option<i32>, LtpError> {
        Ok(self
            .get(PropertyTag::new(id, PropertyType::Integer32))?
            .and_then(|value| value.as_i32()))
    }

    pub fn get_bool(&self, id: u16) -> Result<Option<bool>, LtpError> {
        Ok(self
            .get(PropertyTag::new(id, PropertyType::Boolean))?
            .and_then(|value| value.as_bool()))
    }

    pub fn get_binary(&self, id: u16) -> Result<Option<Vec<u8>>, LtpError> {
        Ok(match self.get(PropertyTag::new(id, PropertyType::Binary))? {
            Some(PropertyValue::Binary(bytes)) => Some(bytes),
            _ => None,
        })
    }

    pub fn get_time(&self, id: u16) -> Result<Option<FileTime>, LtpError> {
        Ok(self
            .get(PropertyTag::new(id, PropertyType::Time))?
            .and_then(|value| value.as_time()))
    }
}
