//! Attachments: a property context sub-node of the owning message.

use tracing::debug;

use crate::ltp::{ObjectRef, PropertyContext, PropertyTag, PropertyType, PropertyValue};
use crate::messaging::error::PstError;
use crate::messaging::message::Message;
use crate::messaging::pst::PstFile;
use crate::messaging::tags;
use crate::ndb::database::NodeRef;
use crate::ndb::ids::Nid;

/// `PidTagAttachMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMethod {
    None,
    ByValue,
    ByReference,
    ByReferenceOnly,
    EmbeddedMessage,
    Storage,
    Unknown(i32),
}

impl From<i32> for AttachMethod {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::None,
            1 => Self::ByValue,
            2 => Self::ByReference,
            4 => Self::ByReferenceOnly,
            5 => Self::EmbeddedMessage,
            6 => Self::Storage,
            other => Self::Unknown(other),
        }
    }
}

/// An attachment's content, by method.
#[derive(Debug)]
pub enum AttachmentData<'a> {
    Bytes(Vec<u8>),
    /// The path of a file the attachment refers to.
    Reference(String),
    Embedded(Message<'a>),
    /// An OLE storage object held in a sub-node of the attachment.
    Storage(ObjectRef),
}

pub struct Attachment<'a> {
    pst: &'a PstFile,
    node: NodeRef,
    pc: PropertyContext<'a>,
}

impl<'a> Attachment<'a> {
    pub(crate) fn open(pst: &'a PstFile, node: NodeRef) -> Result<Self, PstError> {
        let pc = pst.property_context(&node)?;
        debug!(nid = %node.nid, "opened attachment");
        Ok(Self { pst, node, pc })
    }

    #[must_use]
    pub const fn nid(&self) -> Nid {
        self.node.nid
    }

    pub fn method(&self) -> Result<AttachMethod, PstError> {
        Ok(self
            .pc
            .get_i32(tags::ATTACH_METHOD)?
            .map_or(AttachMethod::None, AttachMethod::from))
    }

    /// The long filename, falling back to the 8.3 one.
    pub fn filename(&self) -> Result<Option<String>, PstError> {
        match self.pc.get_string(tags::ATTACH_LONG_FILENAME)? {
            Some(name) if !name.is_empty() => Ok(Some(name)),
            _ => Ok(self.pc.get_string(tags::ATTACH_FILENAME)?),
        }
    }

    pub fn extension(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::ATTACH_EXTENSION)?)
    }

    /// The MIME type, lower-cased.
    pub fn mime_type(&self) -> Result<Option<String>, PstError> {
        Ok(self
            .pc
            .get_string(tags::ATTACH_MIME_TAG)?
            .map(|mime| mime.to_ascii_lowercase()))
    }

    pub fn size(&self) -> Result<Option<i32>, PstError> {
        Ok(self.pc.get_i32(tags::ATTACH_SIZE)?)
    }

    pub fn properties(&self) -> Result<Vec<(PropertyTag, PropertyValue)>, PstError> {
        Ok(self.pc.properties()?)
    }

    /// The attachment's content as its method prescribes. `Ok(None)` when the
    /// method carries no data or the data property is absent.
    pub fn data(&self) -> Result<Option<AttachmentData<'a>>, PstError> {
        match self.method()? {
            AttachMethod::ByReference | AttachMethod::ByReferenceOnly => {
                let path = match self.pc.get_string(tags::ATTACH_LONG_PATHNAME)? {
                    Some(path) => Some(path),
                    None => self.pc.get_string(tags::ATTACH_PATHNAME)?,
                };
                Ok(path.map(AttachmentData::Reference))
            }
            AttachMethod::EmbeddedMessage => {
                let Some(object) = self.object()? else {
                    return Ok(None);
                };
                let node = self
                    .pst
                    .find_subnode(&self.node, object.nid)?
                    .ok_or(PstError::NodeNotFound(object.nid))?;
                Ok(Some(AttachmentData::Embedded(Message::open(self.pst, node)?)))
            }
            AttachMethod::Storage => Ok(self.object()?.map(AttachmentData::Storage)),
            AttachMethod::ByValue | AttachMethod::None | AttachMethod::Unknown(_) => Ok(self
                .pc
                .get_binary(tags::ATTACH_DATA)?
                .map(AttachmentData::Bytes)),
        }
    }

    fn object(&self) -> Result<Option<ObjectRef>, PstError> {
        Ok(
            match self
                .pc
                .get(PropertyTag::new(tags::ATTACH_DATA, PropertyType::Object))?
            {
                Some(PropertyValue::Object(object)) => Some(object),
                _ => None,
            },
        )
    }
}

impl std::fmt::Debug for Attachment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("nid", &self.node.nid)
            .finish_non_exhaustive()
    }
}
