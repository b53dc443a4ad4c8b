//! The message store: the property context describing the mailbox itself.

use crate::bytes::u32_at;
use crate::ltp::{PropertyContext, PropertyTag, PropertyValue};
use crate::messaging::error::PstError;
use crate::messaging::pst::PstFile;
use crate::messaging::tags;
use crate::ndb::crc::compute_crc;
use crate::ndb::ids::Nid;

/// Offset of the NID inside an entry ID: flags (4) and provider UID (16).
const ENTRY_ID_NID_OFFSET: usize = 20;

pub struct MessageStore<'a> {
    pc: PropertyContext<'a>,
}

impl<'a> MessageStore<'a> {
    pub(crate) fn open(pst: &'a PstFile) -> Result<Self, PstError> {
        let node = pst.node(Nid::MESSAGE_STORE)?;
        Ok(Self {
            pc: pst.property_context(&node)?,
        })
    }

    pub fn display_name(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::DISPLAY_NAME)?)
    }

    pub fn record_key(&self) -> Result<Option<Vec<u8>>, PstError> {
        Ok(self.pc.get_binary(tags::RECORD_KEY)?)
    }

    /// The folder at the top of the IPM hierarchy. Stores whose entry ID is
    /// missing or too short use the well-known root folder.
    pub fn root_folder_nid(&self) -> Result<Nid, PstError> {
        let entry_id = self.pc.get_binary(tags::IPM_SUBTREE_ENTRY_ID)?;
        Ok(entry_id
            .and_then(|id| u32_at(&id, ENTRY_ID_NID_OFFSET))
            .map_or(Nid::ROOT_FOLDER, Nid::from_raw))
    }

    /// Whether the store is protected by a password.
    pub fn has_password(&self) -> Result<bool, PstError> {
        Ok(self
            .pc
            .get_i32(tags::PST_PASSWORD)?
            .is_some_and(|stored| stored != 0))
    }

    /// Compare `password` against the stored password CRC. A store without a
    /// password accepts anything.
    pub fn check_password(&self, password: &str) -> Result<bool, PstError> {
        let Some(stored) = self.pc.get_i32(tags::PST_PASSWORD)?.filter(|&stored| stored != 0) else {
            return Ok(true);
        };
        Ok(stored.to_le_bytes() == compute_crc(password.as_bytes()).to_le_bytes())
    }

    pub fn properties(&self) -> Result<Vec<(PropertyTag, PropertyValue)>, PstError> {
        Ok(self.pc.properties()?)
    }
}
