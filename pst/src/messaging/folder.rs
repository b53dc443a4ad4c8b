//! Folders and the summaries in their contents tables.
//!
//! A folder is a property context node plus three table nodes sharing its
//! NID index:
//!
//! ```text
//! 0x0122  folder PC             (NidType::NormalFolder)
//! 0x012D  hierarchy table       (NidType::HierarchyTable)    rows = sub-folders
//! 0x012E  contents table        (NidType::ContentsTable)     rows = messages
//! 0x012F  associated contents   (NidType::AssocContentsTable)
//! ```
//!
//! Tables are opened on demand; a folder with no table node has no rows.

use tracing::debug;

use crate::ltp::{FileTime, PropertyContext, PropertyValue, TableContext};
use crate::messaging::error::PstError;
use crate::messaging::message::{Message, MessageKind};
use crate::messaging::pst::{Collected, PstFile};
use crate::messaging::tags;
use crate::ndb::database::NodeRef;
use crate::ndb::ids::{Nid, NidType};

pub struct Folder<'a> {
    pst: &'a PstFile,
    node: NodeRef,
    pc: PropertyContext<'a>,
}

impl<'a> Folder<'a> {
    pub(crate) fn open(pst: &'a PstFile, node: NodeRef) -> Result<Self, PstError> {
        let pc = pst.property_context(&node)?;
        debug!(nid = %node.nid, "opened folder");
        Ok(Self { pst, node, pc })
    }

    #[must_use]
    pub const fn nid(&self) -> Nid {
        self.node.nid
    }

    #[must_use]
    pub const fn property_context(&self) -> &PropertyContext<'a> {
        &self.pc
    }

    pub fn display_name(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::DISPLAY_NAME)?)
    }

    pub fn container_class(&self) -> Result<Option<String>, PstError> {
        Ok(self.pc.get_string(tags::CONTAINER_CLASS)?)
    }

    pub fn content_count(&self) -> Result<Option<i32>, PstError> {
        Ok(self.pc.get_i32(tags::CONTENT_COUNT)?)
    }

    pub fn unread_count(&self) -> Result<Option<i32>, PstError> {
        Ok(self.pc.get_i32(tags::CONTENT_UNREAD_COUNT)?)
    }

    pub fn has_subfolders(&self) -> Result<bool, PstError> {
        Ok(self.pc.get_bool(tags::SUBFOLDERS)?.unwrap_or(false))
    }

    fn table(&self, nid_type: NidType) -> Result<Option<TableContext<'a>>, PstError> {
        let nid = self.node.nid.with_type(nid_type);
        match self.pst.find_node(nid)? {
            Some(node) => Ok(Some(self.pst.table_context(&node)?)),
            None => Ok(None),
        }
    }

    pub fn hierarchy_table(&self) -> Result<Option<TableContext<'a>>, PstError> {
        self.table(NidType::HierarchyTable)
    }

    pub fn contents_table(&self) -> Result<Option<TableContext<'a>>, PstError> {
        self.table(NidType::ContentsTable)
    }

    pub fn associated_contents_table(&self) -> Result<Option<TableContext<'a>>, PstError> {
        self.table(NidType::AssocContentsTable)
    }

    /// The folders listed in the hierarchy table.
    pub fn subfolders(&self) -> Result<Collected<Self>, PstError> {
        let Some(table) = self.hierarchy_table()? else {
            return Ok(Collected::default());
        };
        self.pst.collect("sub-folder", table.row_count(), |row| {
            let nid = Nid::from_raw(table.row_id(row)?);
            self.pst.folder(nid)
        })
    }

    /// Summaries of the messages listed in the contents table.
    pub fn contents(&self) -> Result<Collected<MessageSummary>, PstError> {
        let Some(table) = self.contents_table()? else {
            return Ok(Collected::default());
        };
        self.pst.collect("message summary", table.row_count(), |row| {
            MessageSummary::from_row(&table, row)
        })
    }

    /// Summaries of the folder-associated information (rules, views, forms).
    pub fn associated_contents(&self) -> Result<Collected<MessageSummary>, PstError> {
        let Some(table) = self.associated_contents_table()? else {
            return Ok(Collected::default());
        };
        self.pst.collect("associated message", table.row_count(), |row| {
            MessageSummary::from_row(&table, row)
        })
    }
}

/// One row of a contents table.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSummary {
    pub nid: Nid,
    pub subject: Option<String>,
    pub message_class: Option<String>,
    pub kind: MessageKind,
    pub delivery_time: Option<FileTime>,
    pub flags: Option<i32>,
    pub size: Option<i32>,
}

impl MessageSummary {
    fn from_row(table: &TableContext<'_>, row: usize) -> Result<Self, PstError> {
        let nid = Nid::from_raw(table.row_id(row)?);
        let string = |id| -> Result<Option<String>, PstError> {
            Ok(match table.get(row, tags::string_tag(id))? {
                Some(PropertyValue::String(s)) => Some(s),
                _ => None,
            })
        };
        let subject = string(tags::SUBJECT)?.map(|s| strip_subject_prefix(&s).to_string());
        let message_class = string(tags::MESSAGE_CLASS)?;
        let kind = message_class
            .as_deref()
            .map_or(MessageKind::Other, MessageKind::from_class);
        Ok(Self {
            nid,
            subject,
            message_class,
            kind,
            delivery_time: table
                .get(row, tags::time_tag(tags::MESSAGE_DELIVERY_TIME))?
                .and_then(|value| value.as_time()),
            flags: table
                .get(row, tags::int_tag(tags::MESSAGE_FLAGS))?
                .and_then(|value| value.as_i32()),
            size: table
                .get(row, tags::int_tag(tags::MESSAGE_SIZE))?
                .and_then(|value| value.as_i32()),
        })
    }

    /// Open the full message this row describes.
    pub fn open<'a>(&self, pst: &'a PstFile) -> Result<Message<'a>, PstError> {
        pst.message(self.nid)
    }
}

/// Drop the `0x01 <length>` marker some subjects carry in front of their
/// normalized form.
#[must_use]
pub fn strip_subject_prefix(subject: &str) -> &str {
    let mut chars = subject.chars();
    if chars.next() == Some('\u{1}') {
        chars.next();
        return chars.as_str();
    }
    subject
}
