//! Stores, folders, messages, attachments and named properties, read
//! through the LTP layer.
//!
//! ```text
//! PstFile ──> MessageStore (0x21) ──> root folder ──> Folder ──> sub-folders
//!         │                                              └─> MessageSummary ──> Message
//!         │                                                         ├─> Recipient
//!         │                                                         └─> Attachment
//!         └─> NameToIdMap (0x61)
//! ```

pub mod attachment;
pub mod error;
pub mod folder;
pub mod message;
pub mod name_to_id;
pub mod pst;
pub mod store;
pub mod tags;

pub use attachment::{AttachMethod, Attachment, AttachmentData};
pub use error::PstError;
pub use folder::{Folder, MessageSummary};
pub use message::{Message, MessageKind, Recipient, RecipientType};
pub use name_to_id::{NameToIdMap, NamedProperty, PropertyName};
pub use pst::{Collected, PstFile};
pub use store::MessageStore;
