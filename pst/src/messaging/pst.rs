//! The open file: entry point to stores, folders and messages.

use std::path::Path;

use tracing::{debug, warn};

use crate::config::{CollectionPolicy, ReaderConfig};
use crate::ltp::{PropertyContext, TableContext};
use crate::messaging::error::PstError;
use crate::messaging::folder::Folder;
use crate::messaging::message::Message;
use crate::messaging::name_to_id::NameToIdMap;
use crate::messaging::store::MessageStore;
use crate::ndb::database::{Ndb, NodeRef};
use crate::ndb::header::Header;
use crate::ndb::ids::Nid;
use crate::ndb::source::{FileSource, MemorySource, Source};
use crate::ndb::NdbError;

/// Elements of a collection, and the elements that failed to decode.
///
/// Under [`CollectionPolicy::Strict`] `failures` is always empty: the first
/// failure is returned as the error instead.
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    /// Row index and error of every skipped element.
    pub failures: Vec<(usize, PstError)>,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> Collected<T> {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An open PST file.
#[derive(Debug)]
pub struct PstFile {
    ndb: Ndb,
    config: ReaderConfig,
}

impl PstFile {
    pub fn open(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self, PstError> {
        let source = FileSource::open(path.as_ref()).map_err(NdbError::from)?;
        debug!(path = %path.as_ref().display(), "opening file");
        Self::from_source(Box::new(source), config)
    }

    /// Open an in-memory image.
    pub fn from_bytes(bytes: Vec<u8>, config: ReaderConfig) -> Result<Self, PstError> {
        Self::from_source(Box::new(MemorySource::new(bytes)), config)
    }

    pub fn from_source(source: Box<dyn Source>, config: ReaderConfig) -> Result<Self, PstError> {
        let ndb = Ndb::open(source, &config)?;
        Ok(Self { ndb, config })
    }

    #[must_use]
    pub const fn ndb(&self) -> &Ndb {
        &self.ndb
    }

    #[must_use]
    pub const fn config(&self) -> &ReaderConfig {
        &self.config
    }

    #[must_use]
    pub const fn header(&self) -> &Header {
        self.ndb.header()
    }

    /// A top-level node. Fails with `NodeNotFound` when it is absent.
    pub fn node(&self, nid: Nid) -> Result<NodeRef, PstError> {
        self.ndb
            .find_node(nid)?
            .map(NodeRef::from)
            .ok_or(PstError::NodeNotFound(nid))
    }

    /// A top-level node, or `None` when it is absent.
    pub fn find_node(&self, nid: Nid) -> Result<Option<NodeRef>, PstError> {
        Ok(self.ndb.find_node(nid)?.map(NodeRef::from))
    }

    /// A sub-node of `parent`, or `None` when it is absent.
    pub fn find_subnode(&self, parent: &NodeRef, nid: Nid) -> Result<Option<NodeRef>, PstError> {
        Ok(self.ndb.subnodes(parent.subnodes).find(nid)?.map(NodeRef::from))
    }

    pub fn property_context(&self, node: &NodeRef) -> Result<PropertyContext<'_>, PstError> {
        Ok(PropertyContext::open(&self.ndb, node)?)
    }

    pub fn table_context(&self, node: &NodeRef) -> Result<TableContext<'_>, PstError> {
        Ok(TableContext::open(&self.ndb, node)?)
    }

    pub fn message_store(&self) -> Result<MessageStore<'_>, PstError> {
        MessageStore::open(self)
    }

    /// The root of the folder hierarchy named by the message store.
    pub fn root_folder(&self) -> Result<Folder<'_>, PstError> {
        let nid = self.message_store()?.root_folder_nid()?;
        self.folder(nid)
    }

    pub fn folder(&self, nid: Nid) -> Result<Folder<'_>, PstError> {
        Folder::open(self, self.node(nid)?)
    }

    pub fn message(&self, nid: Nid) -> Result<Message<'_>, PstError> {
        Message::open(self, self.node(nid)?)
    }

    pub fn name_to_id_map(&self) -> Result<NameToIdMap, PstError> {
        NameToIdMap::open(self)
    }

    /// Decode `count` elements with `decode`, applying the configured
    /// collection policy to failures.
    pub(crate) fn collect<T>(
        &self,
        what: &'static str,
        count: usize,
        mut decode: impl FnMut(usize) -> Result<T, PstError>,
    ) -> Result<Collected<T>, PstError> {
        let mut collected = Collected {
            items: Vec::with_capacity(count),
            failures: Vec::new(),
        };
        for row in 0..count {
            match decode(row) {
                Ok(item) => collected.items.push(item),
                Err(e) => match self.config.collection_policy {
                    CollectionPolicy::Strict => return Err(e),
                    CollectionPolicy::Lenient => {
                        warn!(what, row, error = %e, "skipping element that failed to decode");
                        collected.failures.push((row, e));
                    }
                },
            }
        }
        Ok(collected)
    }
}
