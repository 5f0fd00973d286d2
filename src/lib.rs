//! # cola-rs
//!
//! An ordered set stored as a Cache-Oblivious Lookahead Array (COLA).
//!
//! Elements live in a series of sorted buffers ("levels") where level `i` holds
//! exactly `2^i` elements or none at all. Which levels are occupied mirrors the
//! binary representation of the element count, so an insert is a binary
//! increment (occupied levels carry into the next free one by merging) and a
//! removal is a binary decrement. Inserts cost amortized `O(log n)` element
//! moves with sequential access, and lookups binary-search each occupied level.
//!
//! ## Example
//!
//! ```rust
//! use cola_rs::Cola;
//!
//! let mut set: Cola<u32> = Cola::new();
//! for v in [5, 3, 8, 1] {
//!     set.insert(v).unwrap();
//! }
//!
//! assert_eq!(set.len(), 4);
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 3, 5, 8]);
//! assert_eq!(set.find_next(&3, false), Some(&5));
//! assert!(set.insert(3).is_err());
//! ```

use std::fmt;
use std::mem;
use std::ops::RangeBounds;

use tracing::debug;

pub mod bits;
mod compare;
mod error;
mod iter;
pub mod level;
pub mod merge;
pub mod search;

pub use compare::{Comparator, Natural};
pub use error::{ColaError, Result};
pub use iter::{Enumerator, Iter};
pub use level::Location;
pub use search::FindBetween;

use iter::Cursors;
use level::{is_allocated, AllocatedLevels};

// =============================================================================
// Configuration
// =============================================================================

/// Hard ceiling on the number of levels: counts stay addressable in 32 bits.
pub const MAX_LEVELS: u32 = 31;

/// Level count used by [`Cola::new`].
pub const DEFAULT_LEVELS: u32 = MAX_LEVELS;

// =============================================================================
// Cola
// =============================================================================

/// An ordered set of unique elements under a fixed [`Comparator`].
///
/// The number of levels is fixed at construction and bounds the capacity to
/// `2^levels - 1`. Level buffers are allocated on first use and reused.
///
/// Not synchronized: callers need exclusive access for mutation, which `&mut`
/// already enforces.
#[derive(Clone)]
pub struct Cola<T, C = Natural> {
    /// `levels[i]` holds `2^i` sorted elements when bit `i` of `count` is set,
    /// and is empty otherwise.
    levels: Vec<Vec<T>>,
    count: u32,
    /// Bumped by every successful mutation; checked by [`Enumerator`].
    version: u64,
    cmp: C,
}

impl<T: Ord> Cola<T> {
    /// Empty store with [`DEFAULT_LEVELS`] levels and natural ordering.
    pub fn new() -> Self {
        Self::build(DEFAULT_LEVELS, Natural)
    }

    /// Empty store with natural ordering and room for `2^levels - 1` elements.
    pub fn with_levels(levels: u32) -> Result<Self> {
        Self::with_comparator(levels, Natural)
    }
}

impl<T, C> Cola<T, C> {
    fn build(levels: u32, cmp: C) -> Self {
        debug!(levels, "creating cola");
        Self {
            levels: (0..levels).map(|_| Vec::new()).collect(),
            count: 0,
            version: 0,
            cmp,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum number of elements: `2^level_count - 1`.
    #[inline]
    pub fn capacity(&self) -> usize {
        (1usize << self.levels.len()) - 1
    }

    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Contents of `level`, or `None` if it is free or out of range.
    pub fn level(&self, level: usize) -> Option<&[T]> {
        (level < self.levels.len() && is_allocated(self.count, level))
            .then(|| self.levels[level].as_slice())
    }

    /// Current version stamp.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    #[inline]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
        self.count = 0;
        self.bump_version();
    }

    /// Release buffers of free levels and trim occupied ones.
    pub fn shrink_to_fit(&mut self) {
        for (i, level) in self.levels.iter_mut().enumerate() {
            if is_allocated(self.count, i) {
                level.shrink_to_fit();
            } else {
                *level = Vec::new();
            }
        }
    }

    pub fn memory_usage(&self) -> usize {
        self.levels.capacity() * mem::size_of::<Vec<T>>()
            + self
                .levels
                .iter()
                .map(|l| l.capacity() * mem::size_of::<T>())
                .sum::<usize>()
    }

    /// Element at logical offset `k`. Offsets walk the occupied levels from the
    /// highest down; they are stable only until the next mutation and do not
    /// follow sort order.
    pub fn get_at(&self, k: usize) -> Option<&T> {
        let loc = level::map_offset_to_location(self.count, k)?;
        Some(&self.levels[loc.level][loc.offset])
    }

    /// All elements level by level, highest level first, without merging.
    pub fn iter_unordered(&self) -> impl Iterator<Item = &T> + '_ {
        AllocatedLevels::new(self.count).flat_map(move |level| self.levels[level].iter())
    }

    /// Detached cursor; see [`Enumerator`].
    pub fn enumerator(&self, reverse: bool) -> Enumerator {
        Enumerator::new(self, reverse)
    }
}

impl<T, C: Comparator<T>> Cola<T, C> {
    /// Empty store ordered by `cmp` with room for `2^levels - 1` elements.
    pub fn with_comparator(levels: u32, cmp: C) -> Result<Self> {
        if levels == 0 || levels > MAX_LEVELS {
            return Err(ColaError::InvalidLevelCount {
                levels,
                max: MAX_LEVELS,
            });
        }
        Ok(Self::build(levels, cmp))
    }

    /// Insert `value`. Fails with `DuplicateKey` if an equal element is
    /// stored and `CapacityExceeded` if the store is full; either way the store
    /// is unchanged.
    ///
    /// # Correctness
    ///
    /// The comparator must be a total order. If it is not, the merge can
    /// report `DuplicateKey` after elements have already moved, and the store
    /// is left inconsistent.
    pub fn insert(&mut self, value: T) -> Result<()> {
        let capacity = self.capacity();
        if self.len() >= capacity {
            return Err(ColaError::CapacityExceeded { capacity });
        }
        // The cascade only compares against levels below the carry target.
        if self.locate(&value).is_some() {
            debug!(count = self.count, "rejected duplicate key");
            return Err(ColaError::DuplicateKey);
        }

        merge::insert_cascade(&mut self.levels, self.count, value, &self.cmp)?;
        self.count += 1;
        self.bump_version();
        Ok(())
    }

    /// Insert `value`, or overwrite the stored element that compares equal to
    /// it in place. Returns the overwritten element.
    pub fn update(&mut self, value: T) -> Result<Option<T>> {
        match self.locate(&value) {
            Some(loc) => {
                let old = mem::replace(&mut self.levels[loc.level][loc.offset], value);
                self.bump_version();
                Ok(Some(old))
            }
            None => self.insert(value).map(|()| None),
        }
    }

    /// Remove and return the element equal to `value`, if any.
    pub fn remove(&mut self, value: &T) -> Result<Option<T>> {
        match self.locate(value) {
            Some(loc) => self.remove_located(loc).map(Some),
            None => Ok(None),
        }
    }

    /// Remove and return the element at logical offset `k` (see [`Cola::get_at`]).
    pub fn remove_at(&mut self, k: usize) -> Result<Option<T>> {
        match level::map_offset_to_location(self.count, k) {
            Some(loc) => self.remove_located(loc).map(Some),
            None => Ok(None),
        }
    }

    fn remove_located(&mut self, loc: Location) -> Result<T> {
        let removed =
            merge::remove_cascade(&mut self.levels, self.count, loc.level, loc.offset, &self.cmp)?;
        self.count -= 1;
        self.bump_version();
        Ok(removed)
    }

    /// Swap the element equal to `old` for `new`, keeping the count. `new` may
    /// order anywhere; it takes over `old`'s level. Returns the displaced element.
    pub fn replace(&mut self, old: &T, new: T) -> Result<T> {
        let loc = self.locate(old).ok_or(ColaError::KeyNotFound)?;
        if let Some(other) = self.locate(&new) {
            if other != loc {
                return Err(ColaError::DuplicateKey);
            }
        }
        let displaced =
            merge::merge_in_place(&mut self.levels[loc.level], loc.offset, new, &self.cmp)?;
        self.bump_version();
        Ok(displaced)
    }

    /// Physical position of the element equal to `value`.
    pub fn locate(&self, value: &T) -> Option<Location> {
        search::find(&self.levels, self.count, value, &self.cmp)
    }

    pub fn get(&self, value: &T) -> Option<&T> {
        self.locate(value)
            .map(|loc| &self.levels[loc.level][loc.offset])
    }

    pub fn contains(&self, value: &T) -> bool {
        self.locate(value).is_some()
    }

    /// Logical offset of the element equal to `value` (see [`Cola::get_at`]).
    pub fn position_of(&self, value: &T) -> Option<usize> {
        self.locate(value)
            .and_then(|loc| level::map_location_to_offset(self.count, loc))
    }

    /// Smallest element greater than `value`, or equal to it when `or_equal`.
    pub fn find_next(&self, value: &T, or_equal: bool) -> Option<&T> {
        search::find_next(&self.levels, self.count, value, or_equal, &self.cmp)
            .map(|loc| &self.levels[loc.level][loc.offset])
    }

    /// Largest element less than `value`, or equal to it when `or_equal`.
    pub fn find_previous(&self, value: &T, or_equal: bool) -> Option<&T> {
        search::find_previous(&self.levels, self.count, value, or_equal, &self.cmp)
            .map(|loc| &self.levels[loc.level][loc.offset])
    }

    /// Elements between `begin` and `end`, one sorted run per level with at
    /// most `limit` elements each. Runs are not merged across levels; use
    /// [`Cola::range`] when global order matters.
    pub fn find_between<'a>(
        &'a self,
        begin: &'a T,
        begin_inclusive: bool,
        end: &'a T,
        end_inclusive: bool,
        limit: usize,
    ) -> FindBetween<'a, T, C> {
        FindBetween::new(
            &self.levels,
            self.count,
            begin,
            begin_inclusive,
            end,
            end_inclusive,
            limit,
            &self.cmp,
        )
    }

    /// Elements in ascending order.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter::new(&self.levels, &self.cmp, Cursors::full(&self.levels, self.count))
    }

    /// Elements within `range`, in ascending order.
    ///
    /// ```rust
    /// use cola_rs::Cola;
    ///
    /// let mut set: Cola<u32> = Cola::new();
    /// for v in 0..20 {
    ///     set.insert(v * 10).unwrap();
    /// }
    /// let got: Vec<u32> = set.range(35..=70).copied().collect();
    /// assert_eq!(got, vec![40, 50, 60, 70]);
    /// ```
    pub fn range<R: RangeBounds<T>>(&self, range: R) -> Iter<'_, T, C> {
        let cursors = Cursors::bounded(
            &self.levels,
            self.count,
            range.start_bound(),
            range.end_bound(),
            &self.cmp,
        );
        Iter::new(&self.levels, &self.cmp, cursors)
    }

    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<&T> {
        self.iter().next_back()
    }
}

impl<T: Ord> Default for Cola<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T, C: Comparator<T>> IntoIterator for &'a Cola<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug, C: Comparator<T>> fmt::Debug for Cola<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}


#[cfg(test)]
mod proptests;
