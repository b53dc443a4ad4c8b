//! Property types and their value codecs.
//!
//! Every property carries a 16-bit type code. Fixed-size types decode from a
//! fixed number of little-endian bytes; variable-size types (strings, binary)
//! take the whole value. Setting bit 0x1000 turns a type into its
//! multi-valued form:
//!
//! ```text
//! fixed element type:     element[count]          (count = len / size)
//! variable element type:  count u32, offset u32[count], element bytes...
//! ```
//!
//! A variable multi-value too short to hold its own count and offset table
//! is one element spanning the whole value.

#![allow(clippy::cast_possible_truncation)]

use std::fmt;

use crate::bytes::{bytes_at, u16_at, u32_at};
use crate::ltp::error::LtpError;
use crate::ndb::ids::Nid;

const MULTIPLE: u16 = 0x1000;

/// A property type, named after its MAPI `Ptyp*` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Unspecified,
    Null,
    Integer16,
    Integer32,
    Floating32,
    Floating64,
    Currency,
    FloatingTime,
    ErrorCode,
    Boolean,
    Object,
    Integer64,
    String8,
    String,
    Time,
    Guid,
    ServerId,
    Restriction,
    RuleAction,
    Binary,
    MultipleInteger16,
    MultipleInteger32,
    MultipleFloating32,
    MultipleFloating64,
    MultipleCurrency,
    MultipleFloatingTime,
    MultipleInteger64,
    MultipleString8,
    MultipleString,
    MultipleTime,
    MultipleGuid,
    MultipleBinary,
}

impl PropertyType {
    /// Every type, in code order.
    pub const ALL: [Self; 32] = [
        Self::Unspecified,
        Self::Null,
        Self::Integer16,
        Self::Integer32,
        Self::Floating32,
        Self::Floating64,
        Self::Currency,
        Self::FloatingTime,
        Self::ErrorCode,
        Self::Boolean,
        Self::Object,
        Self::Integer64,
        Self::String8,
        Self::String,
        Self::Time,
        Self::Guid,
        Self::ServerId,
        Self::Restriction,
        Self::RuleAction,
        Self::Binary,
        Self::MultipleInteger16,
        Self::MultipleInteger32,
        Self::MultipleFloating32,
        Self::MultipleFloating64,
        Self::MultipleCurrency,
        Self::MultipleFloatingTime,
        Self::MultipleInteger64,
        Self::MultipleString8,
        Self::MultipleString,
        Self::MultipleTime,
        Self::MultipleGuid,
        Self::MultipleBinary,
    ];

    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Unspecified => 0x0000,
            Self::Null => 0x0001,
            Self::Integer16 => 0x0002,
            Self::Integer32 => 0x0003,
            Self::Floating32 => 0x0004,
            Self::Floating64 => 0x0005,
            Self::Currency => 0x0006,
            Self::FloatingTime => 0x0007,
            Self::ErrorCode => 0x000A,
            Self::Boolean => 0x000B,
            Self::Object => 0x000D,
            Self::Integer64 => 0x0014,
            Self::String8 => 0x001E,
            Self::String => 0x001F,
            Self::Time => 0x0040,
            Self::Guid => 0x0048,
            Self::ServerId => 0x00FB,
            Self::Restriction => 0x00FD,
            Self::RuleAction => 0x00FE,
            Self::Binary => 0x0102,
            Self::MultipleInteger16 => 0x1002,
            Self::MultipleInteger32 => 0x1003,
            Self::MultipleFloating32 => 0x1004,
            Self::MultipleFloating64 => 0x1005,
            Self::MultipleCurrency => 0x1006,
            Self::MultipleFloatingTime => 0x1007,
            Self::MultipleInteger64 => 0x1014,
            Self::MultipleString8 => 0x101E,
            Self::MultipleString => 0x101F,
            Self::MultipleTime => 0x1040,
            Self::MultipleGuid => 0x1048,
            Self::MultipleBinary => 0x1102,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unspecified => "PtypUnspecified",
            Self::Null => "PtypNull",
            Self::Integer16 => "PtypInteger16",
            Self::Integer32 => "PtypInteger32",
            Self::Floating32 => "PtypFloating32",
            Self::Floating64 => "PtypFloating64",
            Self::Currency => "PtypCurrency",
            Self::FloatingTime => "PtypFloatingTime",
            Self::ErrorCode => "PtypErrorCode",
            Self::Boolean => "PtypBoolean",
            Self::Object => "PtypObject",
            Self::Integer64 => "PtypInteger64",
            Self::String8 => "PtypString8",
            Self::String => "PtypString",
            Self::Time => "PtypTime",
            Self::Guid => "PtypGuid",
            Self::ServerId => "PtypServerId",
            Self::Restriction => "PtypRestriction",
            Self::RuleAction => "PtypRuleAction",
            Self::Binary => "PtypBinary",
            Self::MultipleInteger16 => "PtypMultipleInteger16",
            Self::MultipleInteger32 => "PtypMultipleInteger32",
            Self::MultipleFloating32 => "PtypMultipleFloating32",
            Self::MultipleFloating64 => "PtypMultipleFloating64",
            Self::MultipleCurrency => "PtypMultipleCurrency",
            Self::MultipleFloatingTime => "PtypMultipleFloatingTime",
            Self::MultipleInteger64 => "PtypMultipleInteger64",
            Self::MultipleString8 => "PtypMultipleString8",
            Self::MultipleString => "PtypMultipleString",
            Self::MultipleTime => "PtypMultipleTime",
            Self::MultipleGuid => "PtypMultipleGuid",
            Self::MultipleBinary => "PtypMultipleBinary",
        }
    }

    #[must_use]
    pub const fn is_multi_valued(self) -> bool {
        self.code() & MULTIPLE != 0
    }

    /// The type of one element of a multi-valued type; `self` otherwise.
    #[must_use]
    pub const fn element_type(self) -> Self {
        match self {
            Self::MultipleInteger16 => Self::Integer16,
            Self::MultipleInteger32 => Self::Integer32,
            Self::MultipleFloating32 => Self::Floating32,
            Self::MultipleFloating64 => Self::Floating64,
            Self::MultipleCurrency => Self::Currency,
            Self::MultipleFloatingTime => Self::FloatingTime,
            Self::MultipleInteger64 => Self::Integer64,
            Self::MultipleString8 => Self::String8,
            Self::MultipleString => Self::String,
            Self::MultipleTime => Self::Time,
            Self::MultipleGuid => Self::Guid,
            Self::MultipleBinary => Self::Binary,
            other => other,
        }
    }

    /// Size in bytes of a fixed-size value; `None` for variable-size types.
    #[must_use]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Unspecified | Self::Null => Some(0),
            Self::Boolean => Some(1),
            Self::Integer16 => Some(2),
            Self::Integer32 | Self::Floating32 | Self::ErrorCode => Some(4),
            Self::Floating64
            | Self::Currency
            | Self::FloatingTime
            | Self::Integer64
            | Self::Time => Some(8),
            Self::Guid => Some(16),
            _ => None,
        }
    }

    /// Whether a property context stores the value in its 4-byte record slot.
    #[must_use]
    pub const fn is_inline_in_property_context(self) -> bool {
        matches!(self.fixed_size(), Some(size) if size <= 4)
    }

    /// Whether a table context stores the value directly in the row.
    #[must_use]
    pub const fn is_inline_in_table_context(self) -> bool {
        matches!(self.fixed_size(), Some(size) if size <= 8)
    }

    /// The other encoding of a string type (String8 and String), if any.
    #[must_use]
    pub const fn string_counterpart(self) -> Option<Self> {
        match self {
            Self::String8 => Some(Self::String),
            Self::String => Some(Self::String8),
            Self::MultipleString8 => Some(Self::MultipleString),
            Self::MultipleString => Some(Self::MultipleString8),
            _ => None,
        }
    }
}

impl TryFrom<u16> for PropertyType {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|ptype| ptype.code() == code)
            .ok_or(code)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in time: 100-nanosecond intervals since 1601-01-01 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileTime(pub u64);

impl FileTime {
    const TICKS_PER_SECOND: u64 = 10_000_000;
    /// Seconds from 1601-01-01 to 1970-01-01.
    const UNIX_EPOCH_SECONDS: i64 = 11_644_473_600;

    /// Times before 1601 clamp to zero.
    #[must_use]
    pub fn from_unix_seconds(seconds: i64) -> Self {
        let since_1601 = u64::try_from(seconds + Self::UNIX_EPOCH_SECONDS).unwrap_or_default();
        Self(since_1601 * Self::TICKS_PER_SECOND)
    }

    #[must_use]
    pub fn to_unix_seconds(self) -> i64 {
        i64::try_from(self.0 / Self::TICKS_PER_SECOND).unwrap_or(i64::MAX) - Self::UNIX_EPOCH_SECONDS
    }
}

impl fmt::Display for FileTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.to_unix_seconds();
        let days = seconds.div_euclid(86_400);
        let rest = seconds.rem_euclid(86_400);
        let (year, month, day) = civil_from_days(days);
        write!(
            f,
            "{year:04}-{month:02}-{day:02} {:02}:{:02}:{:02} UTC",
            rest / 3600,
            (rest % 3600) / 60,
            rest % 60
        )
    }
}

/// Gregorian date of a day count relative to 1970-01-01.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let shifted = days + 719_468;
    let era = shifted.div_euclid(146_097);
    let day_of_era = shifted - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let march_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * march_month + 2) / 5 + 1;
    let month = if march_month < 10 {
        march_month + 3
    } else {
        march_month - 9
    };
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// A GUID in its on-disk byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// `PS_MAPI`: {00020328-0000-0000-C000-000000000046}.
    pub const PS_MAPI: Self = Self::from_fields(0x0002_0328, 0, 0, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);
    /// `PS_PUBLIC_STRINGS`: {00020329-0000-0000-C000-000000000046}.
    pub const PS_PUBLIC_STRINGS: Self =
        Self::from_fields(0x0002_0329, 0, 0, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);

    #[must_use]
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        let a = data1.to_le_bytes();
        let b = data2.to_le_bytes();
        let c = data3.to_le_bytes();
        Self([
            a[0], a[1], a[2], a[3], b[0], b[1], c[0], c[1], data4[0], data4[1], data4[2],
            data4[3], data4[4], data4[5], data4[6], data4[7],
        ])
    }

    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes_at(bytes, 0, 16)?.try_into().ok().map(Self)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            u16::from_le_bytes([b[4], b[5]]),
            u16::from_le_bytes([b[6], b[7]]),
            b[8],
            b[9],
            b[10],
            b[11],
            b[12],
            b[13],
            b[14],
            b[15]
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({self})")
    }
}

/// A reference to an object stored in a sub-node, such as an embedded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRef {
    pub nid: Nid,
    pub size: u32,
}

/// A decoded property value.
///
/// ANSI and Unicode strings decode to the same `String` variant.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Integer16(i16),
    Integer32(i32),
    Floating32(f32),
    Floating64(f64),
    /// Fixed-point with four decimal places, scaled by 10 000.
    Currency(i64),
    /// Days since 1899-12-30 (OLE automation date).
    FloatingTime(f64),
    ErrorCode(u32),
    Boolean(bool),
    Object(ObjectRef),
    Integer64(i64),
    String(String),
    Time(FileTime),
    Guid(Guid),
    ServerId(Vec<u8>),
    Binary(Vec<u8>),
    MultipleInteger16(Vec<i16>),
    MultipleInteger32(Vec<i32>),
    MultipleFloating32(Vec<f32>),
    MultipleFloating64(Vec<f64>),
    MultipleCurrency(Vec<i64>),
    MultipleFloatingTime(Vec<f64>),
    MultipleInteger64(Vec<i64>),
    MultipleString(Vec<String>),
    MultipleTime(Vec<FileTime>),
    MultipleGuid(Vec<Guid>),
    MultipleBinary(Vec<Vec<u8>>),
}

impl PropertyValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value widened to i64, for any integer type.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Integer16(v) => Some(i64::from(v)),
            Self::Integer32(v) => Some(i64::from(v)),
            Self::Integer64(v) | Self::Currency(v) => Some(v),
            Self::ErrorCode(v) => Some(i64::from(v)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::Integer16(v) => Some(i32::from(v)),
            Self::Integer32(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Boolean(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) | Self::ServerId(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_time(&self) -> Option<FileTime> {
        match *self {
            Self::Time(time) => Some(time),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Integer16(v) => write!(f, "{v}"),
            Self::Integer32(v) => write!(f, "{v}"),
            Self::Integer64(v) => write!(f, "{v}"),
            Self::Floating32(v) => write!(f, "{v}"),
            Self::Floating64(v) | Self::FloatingTime(v) => write!(f, "{v}"),
            Self::Currency(v) => write!(f, "{}.{:04}", v / 10_000, (v % 10_000).abs()),
            Self::ErrorCode(v) => write!(f, "0x{v:08x}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Object(object) => write!(f, "object {} ({} bytes)", object.nid, object.size),
            Self::String(s) => f.write_str(s),
            Self::Time(time) => write!(f, "{time}"),
            Self::Guid(guid) => write!(f, "{guid}"),
            Self::ServerId(bytes) | Self::Binary(bytes) => write!(f, "{} bytes", bytes.len()),
            Self::MultipleString(values) => write!(f, "{values:?}"),
            Self::MultipleBinary(values) => write!(f, "{} values", values.len()),
            Self::MultipleInteger16(values) => write!(f, "{values:?}"),
            Self::MultipleInteger32(values) => write!(f, "{values:?}"),
            Self::MultipleInteger64(values) | Self::MultipleCurrency(values) => {
                write!(f, "{values:?}")
            }
            Self::MultipleFloating32(values) => write!(f, "{values:?}"),
            Self::MultipleFloating64(values) | Self::MultipleFloatingTime(values) => {
                write!(f, "{values:?}")
            }
            Self::MultipleTime(values) => {
                let shown: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{shown:?}")
            }
            Self::MultipleGuid(values) => {
                let shown: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{shown:?}")
            }
        }
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], LtpError> {
    bytes_at(bytes, 0, N)
        .and_then(|b| b.try_into().ok())
        .ok_or(LtpError::DataOverflow {
            needed: N,
            available: bytes.len(),
        })
}

/// Decode an 8-bit string. Bytes map to the Latin-1 code points.
#[must_use]
pub fn decode_string8(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| char::from(b))
        .collect::<String>()
        .trim_end_matches('\0')
        .to_string()
}

/// Decode a UTF-16LE string. A trailing odd byte is ignored.
#[must_use]
pub fn decode_unicode(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

/// Decode a value of a single-valued type.
pub fn decode_value(ptype: PropertyType, bytes: &[u8]) -> Result<PropertyValue, LtpError> {
    if ptype.is_multi_valued() {
        return decode_multi_value(ptype, bytes);
    }
    Ok(match ptype {
        PropertyType::Unspecified | PropertyType::Null => PropertyValue::Null,
        PropertyType::Integer16 => PropertyValue::Integer16(i16::from_le_bytes(fixed(bytes)?)),
        PropertyType::Integer32 => PropertyValue::Integer32(i32::from_le_bytes(fixed(bytes)?)),
        PropertyType::Floating32 => PropertyValue::Floating32(f32::from_le_bytes(fixed(bytes)?)),
        PropertyType::Floating64 => PropertyValue::Floating64(f64::from_le_bytes(fixed(bytes)?)),
        PropertyType::Currency => PropertyValue::Currency(i64::from_le_bytes(fixed(bytes)?)),
        PropertyType::FloatingTime => {
            PropertyValue::FloatingTime(f64::from_le_bytes(fixed(bytes)?))
        }
        PropertyType::ErrorCode => PropertyValue::ErrorCode(u32::from_le_bytes(fixed(bytes)?)),
        PropertyType::Boolean => PropertyValue::Boolean(fixed::<1>(bytes)?[0] != 0),
        PropertyType::Integer64 => PropertyValue::Integer64(i64::from_le_bytes(fixed(bytes)?)),
        PropertyType::Time => PropertyValue::Time(FileTime(u64::from_le_bytes(fixed(bytes)?))),
        PropertyType::Guid => PropertyValue::Guid(Guid(fixed(bytes)?)),
        PropertyType::String8 => PropertyValue::String(decode_string8(bytes)),
        PropertyType::String => PropertyValue::String(decode_unicode(bytes)),
        PropertyType::Binary => PropertyValue::Binary(bytes.to_vec()),
        PropertyType::ServerId => PropertyValue::ServerId(decode_server_id(bytes)),
        PropertyType::Object => {
            let nid = u32_at(bytes, 0).ok_or(LtpError::DataOverflow {
                needed: 8,
                available: bytes.len(),
            })?;
            PropertyValue::Object(ObjectRef {
                nid: Nid::from_raw(nid),
                size: u32_at(bytes, 4).unwrap_or_default(),
            })
        }
        PropertyType::Restriction | PropertyType::RuleAction => {
            return Err(LtpError::UnimplementedPropertyType(ptype));
        }
        _ => return Err(LtpError::UnknownPropertyType(ptype.code())),
    })
}

/// A server ID is stored with a 16-bit length prefix; strip it when it
/// matches the remaining length.
fn decode_server_id(bytes: &[u8]) -> Vec<u8> {
    match u16_at(bytes, 0) {
        Some(len) if usize::from(len) == bytes.len() - 2 => bytes[2..].to_vec(),
        _ => bytes.to_vec(),
    }
}

/// Split a variable-size multi-value into its elements.
///
/// An empty value has no elements. A value too short for its count and
/// offset table is a single element.
pub fn split_multi_value(bytes: &[u8]) -> Result<Vec<&[u8]>, LtpError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let Some(count) = u32_at(bytes, 0).map(|c| c as usize) else {
        return Ok(vec![bytes]);
    };
    let table = count
        .checked_mul(4)
        .and_then(|n| n.checked_add(4))
        .filter(|&n| n <= bytes.len());
    let Some(table_end) = table else {
        return Ok(vec![bytes]);
    };

    let overflow = |needed| LtpError::DataOverflow {
        needed,
        available: bytes.len(),
    };
    let mut offsets = Vec::with_capacity(count + 1);
    for i in 0..count {
        let offset = u32_at(bytes, 4 + 4 * i).ok_or_else(|| overflow(table_end))? as usize;
        offsets.push(offset);
    }
    offsets.push(bytes.len());

    offsets
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            if start < table_end || start > end || end > bytes.len() {
                return Err(overflow(start.max(end)));
            }
            Ok(&bytes[start..end])
        })
        .collect()
}

fn fixed_elements<T, const N: usize>(
    bytes: &[u8],
    decode: impl Fn([u8; N]) -> T,
) -> Result<Vec<T>, LtpError> {
    if bytes.len() % N != 0 {
        return Err(LtpError::DataOverflow {
            needed: bytes.len().div_ceil(N) * N,
            available: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut array = [0u8; N];
            array.copy_from_slice(chunk);
            decode(array)
        })
        .collect())
}

/// Decode a value of a multi-valued type.
pub fn decode_multi_value(ptype: PropertyType, bytes: &[u8]) -> Result<PropertyValue, LtpError> {
    Ok(match ptype {
        PropertyType::MultipleInteger16 => {
            PropertyValue::MultipleInteger16(fixed_elements(bytes, i16::from_le_bytes)?)
        }
        PropertyType::MultipleInteger32 => {
            PropertyValue::MultipleInteger32(fixed_elements(bytes, i32::from_le_bytes)?)
        }
        PropertyType::MultipleFloating32 => {
            PropertyValue::MultipleFloating32(fixed_elements(bytes, f32::from_le_bytes)?)
        }
        PropertyType::MultipleFloating64 => {
            PropertyValue::MultipleFloating64(fixed_elements(bytes, f64::from_le_bytes)?)
        }
        PropertyType::MultipleCurrency => {
            PropertyValue::MultipleCurrency(fixed_elements(bytes, i64::from_le_bytes)?)
        }
        PropertyType::MultipleFloatingTime => {
            PropertyValue::MultipleFloatingTime(fixed_elements(bytes, f64::from_le_bytes)?)
        }
        PropertyType::MultipleInteger64 => {
            PropertyValue::MultipleInteger64(fixed_elements(bytes, i64::from_le_bytes)?)
        }
        PropertyType::MultipleTime => PropertyValue::MultipleTime(fixed_elements(bytes, |b| {
            FileTime(u64::from_le_bytes(b))
        })?),
        PropertyType::MultipleGuid => PropertyValue::MultipleGuid(fixed_elements(bytes, Guid)?),
        PropertyType::MultipleString8 => PropertyValue::MultipleString(
            split_multi_value(bytes)?
                .into_iter()
                .map(decode_string8)
                .collect(),
        ),
        PropertyType::MultipleString => PropertyValue::MultipleString(
            split_multi_value(bytes)?
                .into_iter()
                .map(decode_unicode)
                .collect(),
        ),
        PropertyType::MultipleBinary => PropertyValue::MultipleBinary(
            split_multi_value(bytes)?
                .into_iter()
                .map(<[u8]>::to_vec)
                .collect(),
        ),
        other => return decode_value(other, bytes),
    })
}

/// Decode a value stored inline in a 4-byte property context slot or an
/// 8-byte table row cell.
pub fn decode_inline(ptype: PropertyType, slot: &[u8]) -> Result<PropertyValue, LtpError> {
    let size = ptype.fixed_size().unwrap_or(slot.len()).min(slot.len());
    decode_value(ptype, &slot[..size])
}
