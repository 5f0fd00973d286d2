//! Merge primitives and the two cascades built on them.
//!
//! Inserting is a binary increment: the new element and every occupied level
//! below the first free one are merged into that free level. Removing is a
//! binary decrement: the lowest occupied level is spread across the free
//! levels beneath it, and its smallest element fills the hole left behind.

use std::cmp::Ordering;
use std::mem;

use tracing::{debug, trace};

use crate::bits::lowest_bit;
use crate::compare::Comparator;
use crate::error::{ColaError, Result};
use crate::search::binary_search;

/// Combine two singletons into a sorted pair, appended to `pair`.
pub fn merge_simple<T, C>(pair: &mut Vec<T>, left: T, right: T, cmp: &C) -> Result<()>
where
    C: Comparator<T> + ?Sized,
{
    match cmp.compare(&left, &right) {
        Ordering::Less => {
            pair.push(left);
            pair.push(right);
        }
        Ordering::Greater => {
            pair.push(right);
            pair.push(left);
        }
        Ordering::Equal => return Err(ColaError::DuplicateKey),
    }
    Ok(())
}

/// Merge two sorted buffers into `output`, draining both.
///
/// Buffers of one or two elements each take a short path; those sizes end most
/// insert cascades. On `DuplicateKey` the inputs are consumed and `output`
/// holds a partial merge.
pub fn merge_sort<T, C>(
    output: &mut Vec<T>,
    left: &mut Vec<T>,
    right: &mut Vec<T>,
    cmp: &C,
) -> Result<()>
where
    C: Comparator<T> + ?Sized,
{
    output.reserve(left.len() + right.len());

    match (left.len(), right.len()) {
        (1, 1) => {
            if let (Some(l), Some(r)) = (left.pop(), right.pop()) {
                return merge_simple(output, l, r, cmp);
            }
        }
        (2, 2) => {
            if cmp.compare(&left[1], &right[0]) == Ordering::Less {
                output.append(left);
                output.append(right);
                return Ok(());
            }
            if cmp.compare(&right[1], &left[0]) == Ordering::Less {
                output.append(right);
                output.append(left);
                return Ok(());
            }
        }
        _ => {}
    }

    let mut l = left.drain(..).peekable();
    let mut r = right.drain(..).peekable();
    loop {
        let ord = match (l.peek(), r.peek()) {
            (Some(a), Some(b)) => cmp.compare(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => return Ok(()),
        };
        match ord {
            Ordering::Less => output.extend(l.next()),
            Ordering::Greater => output.extend(r.next()),
            Ordering::Equal => return Err(ColaError::DuplicateKey),
        }
    }
}

/// Fill levels `0..levels.len()` in order from `items`, level `i` taking the
/// next `2^i` elements. Sorted input yields sorted levels.
fn spread_into<T>(levels: &mut [Vec<T>], items: &mut impl Iterator<Item = T>) {
    for (i, dest) in levels.iter_mut().enumerate() {
        debug_assert!(dest.is_empty(), "spread target level {i} is occupied");
        dest.extend(items.by_ref().take(1 << i));
    }
}

/// Vacate a full `level`: elements `[1, 2^level)` go to levels `0..level`
/// (which must be free) and element `0`, the smallest, is returned.
pub fn spread_level<T>(levels: &mut [Vec<T>], level: usize) -> Result<T> {
    let mut source = mem::take(&mut levels[level]);
    let expected = 1usize << level;
    if source.len() != expected {
        let produced = source.len();
        levels[level] = source;
        return Err(ColaError::StructuralInconsistency { expected, produced });
    }

    trace!(level, "spreading level");
    let mut items = source.drain(..);
    let smallest = items.next();
    spread_into(&mut levels[..level], &mut items);
    drop(items);
    // Keep the emptied buffer for the next time this level fills.
    levels[level] = source;

    smallest.ok_or(ColaError::StructuralInconsistency {
        expected,
        produced: 0,
    })
}

/// Overwrite `segment[offset]` with `value`, rotating the shortest run so the
/// segment stays sorted. Returns the displaced element.
///
/// Fails with `DuplicateKey`, leaving the segment untouched, if `value`
/// compares equal to an element other than the one at `offset`.
pub fn merge_in_place<T, C>(segment: &mut [T], offset: usize, value: T, cmp: &C) -> Result<T>
where
    C: Comparator<T> + ?Sized,
{
    match binary_search(segment, &value, cmp) {
        Ok(i) if i == offset => Ok(mem::replace(&mut segment[offset], value)),
        Ok(_) => Err(ColaError::DuplicateKey),
        Err(insert_at) => {
            let old = mem::replace(&mut segment[offset], value);
            if insert_at < offset {
                segment[insert_at..=offset].rotate_right(1);
            } else if insert_at > offset + 1 {
                segment[offset..insert_at].rotate_left(1);
            }
            Ok(old)
        }
    }
}

/// Insert `value` into a store currently holding `count` elements. Returns the
/// level that received the merged run.
///
/// The caller guarantees `value` is absent and that the store is not full.
pub(crate) fn insert_cascade<T, C>(
    levels: &mut [Vec<T>],
    count: u32,
    value: T,
    cmp: &C,
) -> Result<usize>
where
    C: Comparator<T> + ?Sized,
{
    if count & 1 == 0 {
        debug_assert!(levels[0].is_empty());
        levels[0].push(value);
        return Ok(0);
    }

    let target = lowest_bit(!count) as usize;
    debug_assert!(target < levels.len(), "insert into a full store");
    debug!(level = target, count, "insert cascade");

    let size = 1usize << target;
    let mut carry = mem::take(&mut levels[target]);
    carry.reserve(size);
    let single = levels[0].pop().ok_or(ColaError::StructuralInconsistency {
        expected: 1,
        produced: 0,
    })?;
    merge_simple(&mut carry, single, value, cmp)?;

    let mut spare = Vec::with_capacity(size);
    for level in 1..target {
        merge_sort(&mut spare, &mut carry, &mut levels[level], cmp)?;
        mem::swap(&mut carry, &mut spare);
    }

    levels[target] = carry;
    Ok(target)
}

/// Remove the element at (`level`, `offset`) from a store holding `count`
/// elements and return it.
pub(crate) fn remove_cascade<T, C>(
    levels: &mut [Vec<T>],
    count: u32,
    level: usize,
    offset: usize,
    cmp: &C,
) -> Result<T>
where
    C: Comparator<T> + ?Sized,
{
    let lowest = lowest_bit(count) as usize;
    debug_assert!(level >= lowest);

    if level == lowest {
        let mut source = mem::take(&mut levels[level]);
        if offset >= source.len() {
            let produced = source.len();
            levels[level] = source;
            return Err(ColaError::StructuralInconsistency {
                expected: 1 << level,
                produced,
            });
        }
        let removed = source.remove(offset);
        spread_into(&mut levels[..level], &mut source.drain(..));
        levels[level] = source;
        return Ok(removed);
    }

    // Borrow the smallest element of the lowest level to plug the hole.
    debug!(level, lowest, count, "remove borrows from lower level");
    let borrowed = spread_level(levels, lowest)?;
    merge_in_place(&mut levels[level], offset, borrowed, cmp)
}
