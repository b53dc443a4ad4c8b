//! CRC-32 as used by the PST format.
//!
//! The PST checksum is the reflected 0xEDB88320 polynomial with an initial
//! register of zero and no final inversion. `crc32fast` implements the usual
//! variant (register seeded with `!initial`, output inverted), so seeding it
//! with `0xFFFF_FFFF` and inverting the result yields the PST value.

/// Compute the PST CRC of `data`.
#[must_use]
pub fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(0xFFFF_FFFF);
    hasher.update(data);
    !hasher.finalize()
}
