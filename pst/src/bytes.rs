//! Bounds-checked little-endian field access.
//!
//! Every on-disk structure is parsed out of slices whose length is only known
//! at runtime, so these helpers return `None` instead of panicking when a
//! field would run past the end of the slice. Callers map `None` onto their
//! own layer's error.

#![allow(clippy::cast_possible_truncation)]

/// Borrow `len` bytes starting at `offset`.
#[must_use]
pub fn bytes_at(data: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    data.get(offset..offset.checked_add(len)?)
}

fn array_at<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    bytes_at(data, offset, N)?.try_into().ok()
}

#[must_use]
pub fn u8_at(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

#[must_use]
pub fn u16_at(data: &[u8], offset: usize) -> Option<u16> {
    array_at(data, offset).map(u16::from_le_bytes)
}

#[must_use]
pub fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    array_at(data, offset).map(u32::from_le_bytes)
}

#[must_use]
pub fn u64_at(data: &[u8], offset: usize) -> Option<u64> {
    array_at(data, offset).map(u64::from_le_bytes)
}

/// Read an unsigned integer of `width` bytes (1, 2, 4 or 8), widened to u64.
///
/// Used for fields whose width depends on the file format (BIDs, IBs).
#[must_use]
pub fn uint_at(data: &[u8], offset: usize, width: usize) -> Option<u64> {
    match width {
        1 => u8_at(data, offset).map(u64::from),
        2 => u16_at(data, offset).map(u64::from),
        4 => u32_at(data, offset).map(u64::from),
        8 => u64_at(data, offset),
        _ => None,
    }
}

/// Append the low `width` bytes of `value` in little-endian order.
///
/// The counterpart of [`uint_at`], used by the fixture writer.
#[cfg(test)]
pub fn put_uint(out: &mut Vec<u8>, value: u64, width: usize) {
    out.extend_from_slice(&value.to_le_bytes()[..width.min(8)]);
}
