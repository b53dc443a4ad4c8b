// Layers of a read:
// 1. NDB: header, then Node and Block B-trees map NIDs and BIDs to bytes.
//    Blocks are CRC-checked and decrypted; XBLOCKs and sub-node trees are
//    followed to assemble a node's data.
// 2. LTP: node data is a heap-on-node. A BTH on the heap gives property
//    contexts; TCINFO plus a row matrix gives table contexts.
// 3. Messaging: the store, folders, messages, recipients, attachments and
//    the named property map, each a PC or TC at a known NID.
//
// Everything is read-only and borrows from one open `PstFile`.

mod bytes;
pub mod config;
pub mod ltp;
pub mod messaging;
pub mod ndb;

#[cfg(test)]
mod testing;

pub use config::{CollectionPolicy, ConfigError, ReaderConfig};
pub use messaging::{PstError, PstFile};
