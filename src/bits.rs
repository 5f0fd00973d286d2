//! Constant-time bit scans over 32-bit patterns using De Bruijn multiplication.

const DEBRUIJN_LOWEST: u32 = 0x077C_B531;
const DEBRUIJN_HIGHEST: u32 = 0x07C4_ACDD;

static LOWEST_TABLE: [u8; 32] = [
    0, 1, 28, 2, 29, 14, 24, 3, 30, 22, 20, 15, 25, 17, 4, 8, //
    31, 27, 13, 23, 21, 19, 16, 7, 26, 12, 18, 6, 11, 5, 10, 9,
];

static HIGHEST_TABLE: [u8; 32] = [
    0, 9, 1, 10, 13, 21, 2, 29, 11, 14, 16, 18, 22, 25, 3, 30, //
    8, 12, 20, 28, 15, 17, 24, 7, 19, 27, 23, 6, 26, 5, 4, 31,
];

/// Index (0 = LSB) of the highest set bit of `v`.
///
/// Only meaningful for `v > 0`; `highest_bit(0)` returns `0`.
#[inline]
pub fn highest_bit(mut v: u32) -> u32 {
    // Smear the top bit downwards so `v` becomes 2^(k+1) - 1.
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    HIGHEST_TABLE[(v.wrapping_mul(DEBRUIJN_HIGHEST) >> 27) as usize] as u32
}

/// Index (0 = LSB) of the lowest set bit of `v`.
///
/// Only meaningful for `v > 0`; `lowest_bit(0)` returns `0`.
#[inline]
pub fn lowest_bit(v: u32) -> u32 {
    let isolated = v & v.wrapping_neg();
    LOWEST_TABLE[(isolated.wrapping_mul(DEBRUIJN_LOWEST) >> 27) as usize] as u32
}
