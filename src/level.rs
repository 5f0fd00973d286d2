//! Addressing for the level layout.
//!
//! Three coordinate systems name the same slot:
//! - a flat heap index, where level `L` starts at `2^L - 1` and spans `2^L` slots;
//! - a [`Location`] (level, offset within the level);
//! - a logical offset, counting across the *allocated* levels only, from the
//!   highest allocated level down to the lowest.

use crate::bits::{highest_bit, lowest_bit};
use crate::MAX_LEVELS;

const LEVEL_LIMIT: usize = MAX_LEVELS as usize;

/// Slots across levels `0..MAX_LEVELS`.
const MAX_SLOTS: usize = (1 << LEVEL_LIMIT) - 1;

/// Physical position of an element: level index and offset inside that level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub level: usize,
    pub offset: usize,
}

impl Location {
    #[inline]
    pub fn new(level: usize, offset: usize) -> Self {
        Self { level, offset }
    }
}

#[inline]
pub(crate) fn is_allocated(count: u32, level: usize) -> bool {
    level < 32 && count & (1u32 << level) != 0
}

/// Heap index -> location, or `None` when `index >= 2^31 - 1` (past the last
/// slot of level 30).
#[inline]
pub fn from_index(index: usize) -> Option<Location> {
    if index >= MAX_SLOTS {
        return None;
    }
    let slot = index as u32 + 1;
    let level = highest_bit(slot);
    Some(Location::new(level as usize, (slot - (1u32 << level)) as usize))
}

/// Location -> heap index, or `None` unless `level < 31` and
/// `offset < 2^level`.
#[inline]
pub fn to_index(location: Location) -> Option<usize> {
    if location.level >= LEVEL_LIMIT || location.offset >= (1usize << location.level) {
        return None;
    }
    Some((1usize << location.level) - 1 + location.offset)
}

/// Logical offset `k` -> the physical slot holding it, or `None` when
/// `k >= count`.
pub fn map_offset_to_location(count: u32, k: usize) -> Option<Location> {
    if k >= count as usize {
        return None;
    }
    let mut remaining = count;
    let mut k = k;
    loop {
        let level = highest_bit(remaining);
        let size = 1usize << level;
        if k < size {
            return Some(Location::new(level as usize, k));
        }
        k -= size;
        remaining &= !(1u32 << level);
    }
}

/// Inverse of [`map_offset_to_location`]. `None` when `location.level` is not
/// allocated for `count` or `location.offset` lies outside that level.
#[inline]
pub fn map_location_to_offset(count: u32, location: Location) -> Option<usize> {
    if !is_allocated(count, location.level) || location.offset >= (1usize << location.level) {
        return None;
    }
    // Everything above `level` precedes it in logical order.
    let above = (count as u64 >> (location.level + 1)) << (location.level + 1);
    Some(above as usize + location.offset)
}

/// Logical offset -> heap index.
#[inline]
pub fn map_offset_to_index(count: u32, k: usize) -> Option<usize> {
    map_offset_to_location(count, k).and_then(to_index)
}

/// Allocated levels of a store holding `count` elements, highest first.
#[derive(Clone, Debug)]
pub(crate) struct AllocatedLevels {
    remaining: u32,
}

impl AllocatedLevels {
    #[inline]
    pub(crate) fn new(count: u32) -> Self {
        Self { remaining: count }
    }
}

impl Iterator for AllocatedLevels {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let level = highest_bit(self.remaining);
        self.remaining &= !(1u32 << level);
        Some(level as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for AllocatedLevels {
    #[inline]
    fn next_back(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let level = lowest_bit(self.remaining);
        self.remaining &= self.remaining - 1;
        Some(level as usize)
    }
}

impl ExactSizeIterator for AllocatedLevels {}
