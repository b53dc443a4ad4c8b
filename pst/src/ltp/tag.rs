//! Property tags: a 16-bit property ID paired with a 16-bit type code.

use std::fmt;

use crate::ltp::data_type::PropertyType;

/// `id << 16 | type`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyTag(u32);

impl PropertyTag {
    #[must_use]
    pub const fn new(id: u16, ptype: PropertyType) -> Self {
        Self(((id as u32) << 16) | ptype.code() as u32)
    }

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn id(self) -> u16 {
        (self.0 >> 16) as u16
    }

    #[must_use]
    pub const fn type_code(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    /// The decoded type, or the raw code if it is unknown.
    pub fn property_type(self) -> Result<PropertyType, u16> {
        PropertyType::try_from(self.type_code())
    }

    /// Same ID, and the same type or the other encoding of the same string
    /// type.
    #[must_use]
    pub fn matches(self, other: Self) -> bool {
        if self.id() != other.id() {
            return false;
        }
        if self.type_code() == other.type_code() {
            return true;
        }
        self.property_type()
            .ok()
            .and_then(PropertyType::string_counterpart)
            .is_some_and(|counterpart| counterpart.code() == other.type_code())
    }
}

impl fmt::Debug for PropertyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyTag(0x{:08x})", self.0)
    }
}

impl fmt::Display for PropertyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.property_type() {
            Ok(ptype) => write!(f, "0x{:04x} {ptype}", self.id()),
            Err(code) => write!(f, "0x{:04x} 0x{code:04x}", self.id()),
        }
    }
}
