//! Messages: a property context node with attachment and recipient tables
//! among its sub-nodes.

use std::fmt;

use tracing::debug;

use crate::ltp::{FileTime, PropertyContext, PropertyTag, PropertyValue, TableContext};
use crate::messaging::attachment::Attachment;
use crate::messaging::error::PstError;
use crate::messaging::folder::strip_subject_prefix;
use crate::messaging::pst::{Collected, PstFile};
use crate::messaging::tags;
use crate::ndb::database::NodeRef;
use crate::ndb::ids::Nid;

/// Sub-node holding a message's attachment table.
pub const ATTACHMENT_TABLE: Nid = Nid::from_raw(0x671);
/// Sub-node holding a message's recipient table.
pub const RECIPIENT_TABLE: Nid = Nid::from_raw(0x692);

/// What a message object represents, from its message class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Note,
    Appointment,
    Contact,
    DistributionList,
    Journal,
    PersonMetadata,
    StickyNote,
    Task,
    TaskRequest,
    Post,
    MeetingRequest,
    MeetingResponse,
    MeetingCancellation,
    Other,
}

/// Message classes, most specific first. A class matches an entry equal to
/// it or one of its dotted prefixes.
const MESSAGE_CLASSES: [(&str, MessageKind); 15] = [
    ("IPM.Schedule.Meeting.Request", MessageKind::MeetingRequest),
    ("IPM.Schedule.Meeting.Resp", MessageKind::MeetingResponse),
    ("IPM.Schedule.Meeting.Cancelled", MessageKind::MeetingCancellation),
    ("IPM.TaskRequest", MessageKind::TaskRequest),
    ("IPM.Task", MessageKind::Task),
    ("IPM.Appointment", MessageKind::Appointment),
    ("IPM.Contact", MessageKind::Contact),
    ("IPM.DistList", MessageKind::DistributionList),
    ("IPM.Activity", MessageKind::Journal),
    ("IPM.Journal", MessageKind::Journal),
    ("IPM.AbchPerson", MessageKind::PersonMetadata),
    ("IPM.StickyNote", MessageKind::StickyNote),
    ("IPM.Post", MessageKind::Post),
    ("IPM.Note", MessageKind::Note),
    ("IPM", MessageKind::Note),
];

impl MessageKind {
    /// Resolve a message class. Classes compare case-insensitively.
    #[must_use]
    pub fn from_class(class: &str) -> Self {
        MESSAGE_CLASSES
            .iter()
            .find(|(prefix, _)| class_matches(class, prefix))
            .map_or(Self::Other, |(_, kind)| *kind)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Appointment => "appointment",
            Self::Contact => "contact",
            Self::DistributionList => "distribution list",
            Self::Journal => "journal entry",
            Self::PersonMetadata => "person metadata",
            Self::StickyNote => "sticky note",
            Self::Task => "task",
            Self::TaskRequest => "task request",
            Self::Post => "post",
            Self::MeetingRequest => "meeting request",
            Self::MeetingResponse => "meeting response",
            Self::MeetingCancellation => "meeting cancellation",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn class_matches(class: &str, prefix: &str) -> bool {
    let Some(head) = class.get(..prefix.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(prefix)
        && matches!(class.as_bytes().get(prefix.len()), None | Some(b'.'))
}

/// How a recipient was addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientType {
    Originator,
    To,
    Cc,
    Bcc,
    Other(i32),
}

impl From<i32> for RecipientType {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Originator,
            1 => Self::To,
            2 => Self::Cc,
            3 => Self::Bcc,
            other => Self::Other(other),
        }
    }
}

/// One row of a recipient table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub display_name: Option<String>,
    pub email_address: Option<String>,
    pub address_type: Option<String>,
    pub recipient_type: RecipientType,
}

impl Recipient {
    fn from_row(table: &TableContext<'_>, row: usize) -> Result<Self, PstError> {
        let string = |id| -> Result<Option<String>, PstError> {
            Ok(table
                .get(row, tags::string_tag(id))?
                .and_then(|value| value.as_str().map(ToString::to_string)))
        };
        let recipient_type = table
            .get(row, tags::int_tag(tags::RECIPIENT_TYPE))?
            .and_then(|value| value.as_i32())
            .map_or(RecipientType::To, RecipientType::from);
        Ok(Self {
            display_name: string(tags::DISPLAY_NAME)?,
            email_address: string(tags::EMAIL_ADDRESS)?,
            address_type: string(tags::ADDRESS_TYPE)?,
            recipient_type,
        })
    }
}

/// An opened message.
pub struct Message<'a> {
    pst: &'a PstFile,
    node: NodeRef,
    pc: PropertyContext<'a>,
}

impl<'a> Message<'a> {
    /// Open the message stored at `node`, a top-level node or the sub-node of
    /// an embedded message.
    pub(crate) fn open(pst: &'a PstFile, node: NodeRef) -> Result<Self, PstError> {
        let pc = pst.property_context(&node)?;
        debug!(nid = %node.nid, "opened message");
        Ok(Self { pst, node, pc })
    }

    #[must_use]
    pub const fn nid(&self) -> Nid {
        self.node.nid
    }

    #[must_use]
    pub const fn node(&self) -> &NodeRef {
        &self.node
    }

    #[must_use]
    pub const fn property_context(&self) -> &PropertyContext<'a> {
        &self.pc
    }

    pub fn subject(&self) -> Result<Option<String>, PstError> {
        Ok(self
            .pc
            .get_string(tags::SUBJECT)?
            .map(|s| strip_subject_prefix(&s).to_string()))
    }

    pub fn message_class(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::MESSAGE_CLASS)?)
    }

    pub fn kind(&self) -> Result<MessageKind, PstError> {
        Ok(self
            .message_class()?
            .as_deref()
            .map_or(MessageKind::Other, MessageKind::from_class))
    }

    pub fn body(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::BODY)?)
    }

    pub fn html_body(&self) -> Result<Option<Vec<u8>>, PstError> {
        Ok(self.pc.get_binary(tags::BODY_HTML)?)
    }

    pub fn transport_headers(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::TRANSPORT_MESSAGE_HEADERS)?)
    }

    pub fn sender_name(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::SENDER_NAME)?)
    }

    pub fn sent_representing_name(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::SENT_REPRESENTING_NAME)?)
    }

    pub fn display_to(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::DISPLAY_TO)?)
    }

    pub fn submit_time(&self) -> Result<Option<FileTime>, PstError> {
        Ok(self.pc.get_time(tags::CLIENT_SUBMIT_TIME)?)
    }

    pub fn delivery_time(&self) -> Result<Option<FileTime>, PstError> {
        Ok(self.pc.get_time(tags::MESSAGE_DELIVERY_TIME)?)
    }

    pub fn flags(&self) -> Result<Option<i32>, PstError> {
        Ok(self.pc.get_i32(tags::MESSAGE_FLAGS)?)
    }

    pub fn size(&self) -> Result<Option<i32>, PstError> {
        Ok(self.pc.get_i32(tags::MESSAGE_SIZE)?)
    }

    pub fn has_attachments(&self) -> Result<bool, PstError> {
        Ok(self.pc.get_bool(tags::HAS_ATTACHMENTS)?.unwrap_or(false))
    }

    pub fn properties(&self) -> Result<Vec<(PropertyTag, PropertyValue)>, PstError> {
        Ok(self.pc.properties()?)
    }

    fn subnode_table(&self, nid: Nid) -> Result<Option<TableContext<'a>>, PstError> {
        match self.pst.find_subnode(&self.node, nid)? {
            Some(node) => Ok(Some(self.pst.table_context(&node)?)),
            None => Ok(None),
        }
    }

    pub fn attachment_table(&self) -> Result<Option<TableContext<'a>>, PstError> {
        self.subnode_table(ATTACHMENT_TABLE)
    }

    pub fn recipient_table(&self) -> Result<Option<TableContext<'a>>, PstError> {
        self.subnode_table(RECIPIENT_TABLE)
    }

    /// The attachments listed in the attachment table. Each row ID names the
    /// sub-node holding that attachment.
    pub fn attachments(&self) -> Result<Collected<Attachment<'a>>, PstError> {
        let Some(table) = self.attachment_table()? else {
            return Ok(Collected::default());
        };
        self.pst.collect("attachment", table.row_count(), |row| {
            let nid = Nid::from_raw(table.row_id(row)?);
            let node = self
                .pst
                .find_subnode(&self.node, nid)?
                .ok_or(PstError::NodeNotFound(nid))?;
            Attachment::open(self.pst, node)
        })
    }

    pub fn recipients(&self) -> Result<Collected<Recipient>, PstError> {
        let Some(table) = self.recipient_table()? else {
            return Ok(Collected::default());
        };
        self.pst.collect("recipient", table.row_count(), |row| {
            Recipient::from_row(&table, row)
        })
    }
}

impl fmt::Debug for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("nid", &self.node.nid)
            .finish_non_exhaustive()
    }
}
