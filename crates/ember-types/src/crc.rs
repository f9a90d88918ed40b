//! CRC32 (IEEE 802.3, reflected) used by the `crc` console command and the
//! boot-image integrity check.

/// Initial running state for the incremental form.
pub const CRC32_INIT: u32 = 0xffff_ffff;

/// Feed a chunk into a running CRC32 state. Seed with [`CRC32_INIT`],
/// finalize by complementing.
pub fn crc32_update(mut state: u32, data: &[u8]) -> u32 {
    for &byte in data {
        state ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (state & 1).wrapping_neg();
            state = (state >> 1) ^ (0xedb8_8320 & mask);
        }
    }
    state
}

/// Compute the CRC32 of a byte slice.
pub fn crc32(data: &[u8]) -> u32 {
    !crc32_update(CRC32_INIT, data)
}
