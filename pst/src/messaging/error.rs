//! Errors raised while reading stores, folders, messages and named
//! properties.

use crate::ltp::LtpError;
use crate::ndb::NdbError;
use crate::ndb::ids::Nid;

#[derive(Debug)]
pub enum PstError {
    Ndb(NdbError),
    Ltp(LtpError),
    /// A node the messaging layer needs is missing from the Node B-tree or
    /// from a sub-node tree.
    NodeNotFound(Nid),
    /// The name-to-ID map lacks one of its streams.
    NameIdStreamNotFound(&'static str),
    /// A name-to-ID map stream is malformed.
    IncorrectNameIdStreamContent(&'static str),
}

impl std::fmt::Display for PstError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ndb(e) => write!(f, "{e}"),
            Self::Ltp(e) => write!(f, "{e}"),
            Self::NodeNotFound(nid) => write!(f, "node {nid} not found"),
            Self::NameIdStreamNotFound(stream) => {
                write!(f, "name-to-ID map has no {stream} stream")
            }
            Self::IncorrectNameIdStreamContent(reason) => {
                write!(f, "incorrect name-to-ID stream content: {reason}")
            }
        }
    }
}

impl std::error::Error for PstError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ndb(e) => Some(e),
            Self::Ltp(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NdbError> for PstError {
    fn from(e: NdbError) -> Self {
        Self::Ndb(e)
    }
}

impl From<LtpError> for PstError {
    fn from(e: LtpError) -> Self {
        Self::Ltp(e)
    }
}
