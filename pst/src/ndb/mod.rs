//! The node database (NDB) layer.
//!
//! Translates node IDs and block IDs into bytes:
//!
//! ```text
//! header ──> Node B-tree root ──> NID ──> (data BID, sub-node BID)
//!        └─> Block B-tree root ──> BID ──> (IB, cb) ──> read, CRC, decrypt
//! ```

pub mod block;
pub mod btree;
pub mod crc;
pub mod crypt;
pub mod database;
pub mod error;
pub mod header;
pub mod ids;
pub mod page;
pub mod source;
pub mod subnode;
pub mod tree;

pub use database::{Ndb, NodeRef};
pub use error::NdbError;
pub use header::{FileFormat, Header, HeaderError};
pub use ids::{Bid, Bref, Nid, NidType};
pub use source::{FileSource, MemorySource, Source, SourceError};
