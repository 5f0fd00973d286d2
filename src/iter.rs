//! Ordered traversal by k-way merge over one cursor per allocated level.
//!
//! Each level keeps a `[front, back)` window of unread slots. Stepping forward
//! yields the smallest element among the fronts; stepping backward yields the
//! largest among the backs. Exhausted levels at the edges of the active level
//! window are dropped so later steps skip them.

use std::cmp::Ordering;
use std::iter::FusedIterator;
use std::ops::Bound;

use tracing::error;

use crate::compare::Comparator;
use crate::error::{ColaError, Result};
use crate::level::{AllocatedLevels, Location};
use crate::search::{lower_bound, upper_bound};
use crate::{Cola, MAX_LEVELS};

const SLOTS: usize = MAX_LEVELS as usize;

#[derive(Clone, Debug)]
pub(crate) struct Cursors {
    front: [usize; SLOTS],
    back: [usize; SLOTS],
    /// Active level window `[low, high)`.
    low: usize,
    high: usize,
    expected: usize,
    remaining: usize,
}

impl Cursors {
    fn empty() -> Self {
        Self {
            front: [0; SLOTS],
            back: [0; SLOTS],
            low: SLOTS,
            high: 0,
            expected: 0,
            remaining: 0,
        }
    }

    fn open(&mut self, level: usize, start: usize, stop: usize) {
        self.front[level] = start;
        self.back[level] = stop;
        self.low = self.low.min(level);
        self.high = self.high.max(level + 1);
    }

    /// Every element of a store holding `count` elements.
    ///
    /// Windows are clamped to what the buffers actually hold, so a short level
    /// surfaces as `StructuralInconsistency` instead of an out-of-bounds read.
    pub(crate) fn full<T>(levels: &[Vec<T>], count: u32) -> Self {
        let mut cursors = Self::empty();
        for level in AllocatedLevels::new(count) {
            let len = levels[level].len().min(1 << level);
            cursors.open(level, 0, len);
        }
        cursors.expected = count as usize;
        cursors.remaining = count as usize;
        cursors
    }

    /// Elements between `begin` and `end`.
    pub(crate) fn bounded<T, C>(
        levels: &[Vec<T>],
        count: u32,
        begin: Bound<&T>,
        end: Bound<&T>,
        cmp: &C,
    ) -> Self
    where
        C: Comparator<T> + ?Sized,
    {
        let mut cursors = Self::empty();
        let mut total = 0;
        for level in AllocatedLevels::new(count) {
            let buffer = &levels[level];
            let start = match begin {
                Bound::Included(v) => lower_bound(buffer, v, true, cmp),
                Bound::Excluded(v) => lower_bound(buffer, v, false, cmp),
                Bound::Unbounded => 0,
            };
            let stop = match end {
                Bound::Included(v) => upper_bound(buffer, v, true, cmp),
                Bound::Excluded(v) => upper_bound(buffer, v, false, cmp),
                Bound::Unbounded => buffer.len(),
            };
            if start < stop {
                cursors.open(level, start, stop);
                total += stop - start;
            }
        }
        cursors.expected = total;
        cursors.remaining = total;
        cursors
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.remaining
    }

    #[inline]
    fn live(&self, level: usize) -> bool {
        self.front[level] < self.back[level]
    }

    fn shrink_window(&mut self) {
        while self.low < self.high && !self.live(self.low) {
            self.low += 1;
        }
        while self.high > self.low && !self.live(self.high - 1) {
            self.high -= 1;
        }
    }

    fn exhausted(&self) -> ColaError {
        let produced = self.expected - self.remaining;
        error!(
            expected = self.expected,
            produced, "ordered iteration ran out of elements"
        );
        ColaError::StructuralInconsistency {
            expected: self.expected,
            produced,
        }
    }

    /// Take the smallest unread element.
    pub(crate) fn step_front<T, C>(&mut self, levels: &[Vec<T>], cmp: &C) -> Result<Option<Location>>
    where
        C: Comparator<T> + ?Sized,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.shrink_window();

        let mut best: Option<usize> = None;
        for level in self.low..self.high {
            if !self.live(level) {
                continue;
            }
            let candidate = &levels[level][self.front[level]];
            best = match best {
                Some(b) if cmp.compare(candidate, &levels[b][self.front[b]]) != Ordering::Less => {
                    Some(b)
                }
                _ => Some(level),
            };
        }

        let level = best.ok_or_else(|| self.exhausted())?;
        let offset = self.front[level];
        self.front[level] += 1;
        self.remaining -= 1;
        Ok(Some(Location::new(level, offset)))
    }

    /// Take the largest unread element.
    pub(crate) fn step_back<T, C>(&mut self, levels: &[Vec<T>], cmp: &C) -> Result<Option<Location>>
    where
        C: Comparator<T> + ?Sized,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.shrink_window();

        let mut best: Option<usize> = None;
        for level in self.low..self.high {
            if !self.live(level) {
                continue;
            }
            let candidate = &levels[level][self.back[level] - 1];
            best = match best {
                Some(b)
                    if cmp.compare(candidate, &levels[b][self.back[b] - 1])
                        != Ordering::Greater =>
                {
                    Some(b)
                }
                _ => Some(level),
            };
        }

        let level = best.ok_or_else(|| self.exhausted())?;
        self.back[level] -= 1;
        self.remaining -= 1;
        Ok(Some(Location::new(level, self.back[level])))
    }
}

/// Globally ordered iterator over a [`Cola`], or a bounded range of it.
///
/// Double-ended: `iter().rev()` walks in descending order.
///
/// # Panics
///
/// Panics if the levels hold fewer elements than the store's count implies.
/// That only happens if the store is corrupt.
pub struct Iter<'a, T, C: ?Sized> {
    levels: &'a [Vec<T>],
    cmp: &'a C,
    cursors: Cursors,
}

impl<'a, T, C: ?Sized> Iter<'a, T, C> {
    pub(crate) fn new(levels: &'a [Vec<T>], cmp: &'a C, cursors: Cursors) -> Self {
        Self {
            levels,
            cmp,
            cursors,
        }
    }
}

impl<'a, T, C: ?Sized> Clone for Iter<'a, T, C> {
    fn clone(&self) -> Self {
        Self {
            levels: self.levels,
            cmp: self.cmp,
            cursors: self.cursors.clone(),
        }
    }
}

impl<'a, T, C> Iterator for Iter<'a, T, C>
where
    C: Comparator<T> + ?Sized,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let levels = self.levels;
        match self.cursors.step_front(levels, self.cmp) {
            Ok(loc) => loc.map(|l| &levels[l.level][l.offset]),
            Err(err) => panic!("{err}"),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.cursors.remaining();
        (n, Some(n))
    }
}

impl<'a, T, C> DoubleEndedIterator for Iter<'a, T, C>
where
    C: Comparator<T> + ?Sized,
{
    fn next_back(&mut self) -> Option<&'a T> {
        let levels = self.levels;
        match self.cursors.step_back(levels, self.cmp) {
            Ok(loc) => loc.map(|l| &levels[l.level][l.offset]),
            Err(err) => panic!("{err}"),
        }
    }
}

impl<'a, T, C> ExactSizeIterator for Iter<'a, T, C> where C: Comparator<T> + ?Sized {}

impl<'a, T, C> FusedIterator for Iter<'a, T, C> where C: Comparator<T> + ?Sized {}

/// Detached forward or backward cursor over a [`Cola`].
///
/// Holds no borrow of the store: every call takes the store explicitly and
/// checks its version stamp, failing with [`ColaError::VersionChanged`] once the
/// store has been mutated since the enumerator was created.
#[derive(Clone, Debug)]
pub struct Enumerator {
    cursors: Cursors,
    current: Option<Location>,
    version: u64,
    reverse: bool,
}

impl Enumerator {
    pub(crate) fn new<T, C>(cola: &Cola<T, C>, reverse: bool) -> Self {
        Self {
            cursors: Cursors::full(&cola.levels, cola.count),
            current: None,
            version: cola.version,
            reverse,
        }
    }

    fn check<T, C>(&self, cola: &Cola<T, C>) -> Result<()> {
        if cola.version != self.version {
            return Err(ColaError::VersionChanged);
        }
        Ok(())
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Advance to the next element. Returns `Ok(false)` once exhausted.
    pub fn move_next<T, C>(&mut self, cola: &Cola<T, C>) -> Result<bool>
    where
        C: Comparator<T>,
    {
        self.check(cola)?;
        let step = if self.reverse {
            self.cursors.step_back(&cola.levels, &cola.cmp)
        } else {
            self.cursors.step_front(&cola.levels, &cola.cmp)
        };
        self.current = step?;
        Ok(self.current.is_some())
    }

    /// Element under the cursor; `None` before the first `move_next` and after
    /// the last.
    pub fn current<'a, T, C>(&self, cola: &'a Cola<T, C>) -> Result<Option<&'a T>> {
        self.check(cola)?;
        Ok(self
            .current
            .map(|loc| &cola.levels[loc.level][loc.offset]))
    }

    /// Rewind to before the first element.
    pub fn reset<T, C>(&mut self, cola: &Cola<T, C>) -> Result<()> {
        self.check(cola)?;
        self.cursors = Cursors::full(&cola.levels, cola.count);
        self.current = None;
        Ok(())
    }
}
