//! Searches over one level and across all allocated levels.

use std::cmp::Ordering;
use std::iter::FusedIterator;

use crate::compare::Comparator;
use crate::level::{AllocatedLevels, Location};

/// Binary search for `value` in a sorted buffer.
///
/// `Ok(i)` if `buffer[i]` compares equal, otherwise `Err(i)` with the insertion
/// point. The last and first elements are checked before bisecting, since
/// accesses cluster at level edges (appends, minimum/maximum probes).
pub fn binary_search<T, C>(buffer: &[T], value: &T, cmp: &C) -> Result<usize, usize>
where
    C: Comparator<T> + ?Sized,
{
    let len = buffer.len();
    if len == 0 {
        return Err(0);
    }

    match cmp.compare(value, &buffer[len - 1]) {
        Ordering::Greater => return Err(len),
        Ordering::Equal => return Ok(len - 1),
        Ordering::Less => {}
    }
    match cmp.compare(value, &buffer[0]) {
        Ordering::Less => return Err(0),
        Ordering::Equal => return Ok(0),
        Ordering::Greater => {}
    }

    // buffer[0] < value < buffer[len - 1]
    let mut lo = 1;
    let mut hi = len - 1;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match cmp.compare(&buffer[mid], value) {
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
            Ordering::Equal => return Ok(mid),
        }
    }
    Err(lo)
}

/// Index of the first element not ordered before `value` (or after it, when
/// `inclusive` is false).
#[inline]
pub(crate) fn lower_bound<T, C>(buffer: &[T], value: &T, inclusive: bool, cmp: &C) -> usize
where
    C: Comparator<T> + ?Sized,
{
    match binary_search(buffer, value, cmp) {
        Ok(i) if inclusive => i,
        Ok(i) => i + 1,
        Err(i) => i,
    }
}

/// One past the last element not ordered after `value` (or before it, when
/// `inclusive` is false).
#[inline]
pub(crate) fn upper_bound<T, C>(buffer: &[T], value: &T, inclusive: bool, cmp: &C) -> usize
where
    C: Comparator<T> + ?Sized,
{
    match binary_search(buffer, value, cmp) {
        Ok(i) if inclusive => i + 1,
        Ok(i) => i,
        Err(i) => i,
    }
}

/// Exact match across all allocated levels.
pub(crate) fn find<T, C>(levels: &[Vec<T>], count: u32, value: &T, cmp: &C) -> Option<Location>
where
    C: Comparator<T> + ?Sized,
{
    AllocatedLevels::new(count).find_map(|level| {
        binary_search(&levels[level], value, cmp)
            .ok()
            .map(|offset| Location::new(level, offset))
    })
}

/// Smallest element greater than `value` (or equal, with `or_equal`).
pub(crate) fn find_next<T, C>(
    levels: &[Vec<T>],
    count: u32,
    value: &T,
    or_equal: bool,
    cmp: &C,
) -> Option<Location>
where
    C: Comparator<T> + ?Sized,
{
    let mut best: Option<Location> = None;
    for level in AllocatedLevels::new(count) {
        let buffer = &levels[level];
        let offset = match binary_search(buffer, value, cmp) {
            Ok(i) if or_equal => return Some(Location::new(level, i)),
            Ok(i) => i + 1,
            Err(i) => i,
        };
        if offset >= buffer.len() {
            continue;
        }
        let replace = match best {
            None => true,
            Some(b) => cmp.compare(&buffer[offset], &levels[b.level][b.offset]) == Ordering::Less,
        };
        if replace {
            best = Some(Location::new(level, offset));
        }
    }
    best
}

/// Largest element less than `value` (or equal, with `or_equal`).
pub(crate) fn find_previous<T, C>(
    levels: &[Vec<T>],
    count: u32,
    value: &T,
    or_equal: bool,
    cmp: &C,
) -> Option<Location>
where
    C: Comparator<T> + ?Sized,
{
    let mut best: Option<Location> = None;
    for level in AllocatedLevels::new(count) {
        let buffer = &levels[level];
        let offset = match binary_search(buffer, value, cmp) {
            Ok(i) if or_equal => return Some(Location::new(level, i)),
            Ok(i) | Err(i) => match i.checked_sub(1) {
                Some(o) => o,
                None => continue,
            },
        };
        let replace = match best {
            None => true,
            Some(b) => {
                cmp.compare(&buffer[offset], &levels[b.level][b.offset]) == Ordering::Greater
            }
        };
        if replace {
            best = Some(Location::new(level, offset));
        }
    }
    best
}

/// Elements between two bounds, one contiguous run per allocated level.
///
/// Levels are visited highest first and each yields at most `limit` elements.
/// There is no ordering across levels; use [`Cola::range`](crate::Cola::range)
/// for a globally ordered walk.
pub struct FindBetween<'a, T, C: ?Sized> {
    levels: &'a [Vec<T>],
    cmp: &'a C,
    begin: &'a T,
    begin_inclusive: bool,
    end: &'a T,
    end_inclusive: bool,
    limit: usize,
    pending: AllocatedLevels,
    run: std::slice::Iter<'a, T>,
}

impl<'a, T, C> FindBetween<'a, T, C>
where
    C: Comparator<T> + ?Sized,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        levels: &'a [Vec<T>],
        count: u32,
        begin: &'a T,
        begin_inclusive: bool,
        end: &'a T,
        end_inclusive: bool,
        limit: usize,
        cmp: &'a C,
    ) -> Self {
        Self {
            levels,
            cmp,
            begin,
            begin_inclusive,
            end,
            end_inclusive,
            limit,
            pending: AllocatedLevels::new(count),
            run: Default::default(),
        }
    }

    fn next_run(&mut self, level: usize) -> std::slice::Iter<'a, T> {
        let levels = self.levels;
        let buffer: &'a [T] = &levels[level];
        let start = lower_bound(buffer, self.begin, self.begin_inclusive, self.cmp);
        let end = upper_bound(buffer, self.end, self.end_inclusive, self.cmp);
        if start >= end {
            return Default::default();
        }
        let end = end.min(start.saturating_add(self.limit));
        buffer[start..end].iter()
    }
}

impl<'a, T, C> Iterator for FindBetween<'a, T, C>
where
    C: Comparator<T> + ?Sized,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(item) = self.run.next() {
                return Some(item);
            }
            if self.limit == 0 {
                return None;
            }
            let level = self.pending.next()?;
            self.run = self.next_run(level);
        }
    }
}

impl<'a, T, C> FusedIterator for FindBetween<'a, T, C> where C: Comparator<T> + ?Sized {}
