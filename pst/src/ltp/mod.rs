//! Lists, tables and properties: structures built on node data.
//!
//! ```text
//! node data --> HeapOnNode --> BTreeOnHeap --> PropertyContext
//!                          \-> TCINFO + row matrix --> TableContext
//! ```

pub mod bth;
pub mod data_type;
pub mod error;
pub mod heap;
pub mod property_context;
pub mod table_context;
pub mod tag;

pub use bth::BTreeOnHeap;
pub use data_type::{FileTime, Guid, ObjectRef, PropertyType, PropertyValue};
pub use error::LtpError;
pub use heap::{ClientSignature, HeapOnNode, Hid, Hnid};
pub use property_context::PropertyContext;
pub use table_context::{Column, TableContext};
pub use tag::PropertyTag;
