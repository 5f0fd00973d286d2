use super::{is_allocated, level, Cola, ColaError, Comparator};

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::cmp::Ordering;
use std::collections::BTreeSet;

fn validate_store<T, C: Comparator<T>>(c: &Cola<T, C>) {
    let mut total = 0usize;
    for (i, buffer) in c.levels.iter().enumerate() {
        if is_allocated(c.count, i) {
            assert_eq!(buffer.len(), 1 << i, "allocated level {i} must be full");
            for pair in buffer.windows(2) {
                assert_eq!(
                    c.cmp.compare(&pair[0], &pair[1]),
                    Ordering::Less,
                    "level {i} must be strictly ascending"
                );
            }
            total += buffer.len();
        } else {
            assert!(buffer.is_empty(), "free level {i} must hold nothing");
        }
    }
    assert_eq!(total, c.len(), "allocated capacity must equal the count");

    // Strictly ascending across levels implies global uniqueness.
    let ordered: Vec<&T> = c.iter().collect();
    assert_eq!(ordered.len(), c.len());
    for pair in ordered.windows(2) {
        assert_eq!(c.cmp.compare(pair[0], pair[1]), Ordering::Less);
    }

    let mut reversed: Vec<&T> = c.iter().rev().collect();
    reversed.reverse();
    assert_eq!(reversed.len(), ordered.len());
    for (a, b) in reversed.iter().zip(&ordered) {
        assert!(std::ptr::eq(*a, *b), "reverse walk must mirror forward walk");
    }

    for k in 0..c.len() {
        let loc = level::map_offset_to_location(c.count, k).expect("offset in range");
        assert_eq!(level::map_location_to_offset(c.count, loc), Some(k));
    }
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 40)]
    Insert(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 20)]
    Remove(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 4)]
    RemoveAt(#[proptest(strategy = "0usize..600")] usize),
    #[proptest(weight = 10)]
    Replace(
        #[proptest(strategy = "0u16..512")] u16,
        #[proptest(strategy = "0u16..512")] u16,
    ),
    #[proptest(weight = 15)]
    Neighbors(#[proptest(strategy = "0u16..512")] u16, bool),
    #[proptest(weight = 10)]
    Range(
        #[proptest(strategy = "0u16..512")] u16,
        #[proptest(strategy = "0u16..512")] u16,
    ),
    #[proptest(weight = 1)]
    Clear,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=1500)) {
        let mut c: Cola<u16> = Cola::with_levels(10).unwrap();
        let mut m: BTreeSet<u16> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let expected = if m.insert(key) { Ok(()) } else { Err(ColaError::DuplicateKey) };
                    prop_assert_eq!(c.insert(key), expected);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(c.remove(&key), Ok(m.take(&key)));
                }
                Op::RemoveAt(k) => {
                    let expected = c.get_at(k).copied();
                    prop_assert_eq!(expected.is_some(), k < m.len());
                    prop_assert_eq!(c.remove_at(k), Ok(expected));
                    if let Some(v) = expected {
                        prop_assert!(m.remove(&v));
                    }
                }
                Op::Replace(old, new) => {
                    let expected = if !m.contains(&old) {
                        Err(ColaError::KeyNotFound)
                    } else if old != new && m.contains(&new) {
                        Err(ColaError::DuplicateKey)
                    } else {
                        m.remove(&old);
                        m.insert(new);
                        Ok(old)
                    };
                    prop_assert_eq!(c.replace(&old, new), expected);
                }
                Op::Neighbors(key, or_equal) => {
                    let next = if or_equal { m.range(key..).next() } else { m.range(key + 1..).next() };
                    let previous = if or_equal { m.range(..=key).next_back() } else { m.range(..key).next_back() };
                    prop_assert_eq!(c.find_next(&key, or_equal), next);
                    prop_assert_eq!(c.find_previous(&key, or_equal), previous);
                }
                Op::Range(a, b) => {
                    let (lo, hi) = (a.min(b), a.max(b));
                    let expected: Vec<u16> = m.range(lo..hi).copied().collect();
                    let got: Vec<u16> = c.range(lo..hi).copied().collect();
                    prop_assert_eq!(&got, &expected);

                    let mut between: Vec<u16> =
                        c.find_between(&lo, true, &hi, false, usize::MAX).copied().collect();
                    between.sort_unstable();
                    prop_assert_eq!(&between, &expected);
                }
                Op::Clear => {
                    c.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(c.len(), m.len());
        }

        validate_store(&c);
        let got: Vec<u16> = c.iter().copied().collect();
        let expected: Vec<u16> = m.iter().copied().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_distinct_inserts_keep_levels_sorted(keys in prop::collection::btree_set(any::<u32>(), 0..=700)) {
        let mut shuffled: Vec<u32> = keys.iter().copied().collect();
        // Interleave both ends so insertion order is neither ascending nor descending.
        let mut order = Vec::with_capacity(shuffled.len());
        while !shuffled.is_empty() {
            order.push(shuffled.remove(0));
            if let Some(v) = shuffled.pop() {
                order.push(v);
            }
        }

        let mut c: Cola<u32> = Cola::new();
        for v in order {
            c.insert(v).unwrap();
        }
        validate_store(&c);
        let got: Vec<u32> = c.iter().copied().collect();
        let expected: Vec<u32> = keys.into_iter().collect();
        prop_assert_eq!(got, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u32> = vec![10, 20, 30, 40, 50, 60, 70];

    for_each_permutation(&keys, |perm| {
        let mut c: Cola<u32> = Cola::with_levels(3).unwrap();
        for k in perm {
            c.insert(k).unwrap();
            validate_store(&c);
        }
        let got: Vec<u32> = c.iter().copied().collect();
        assert_eq!(got, keys);
        assert_eq!(c.level(2).map(<[u32]>::len), Some(4));
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u32> = vec![10, 20, 30, 40, 50, 60];

    // Insert in a fixed order, then remove in all permutations.
    let mut base: Cola<u32> = Cola::with_levels(3).unwrap();
    for &k in &keys {
        base.insert(k).unwrap();
    }

    for_each_permutation(&keys, |perm| {
        let mut c = base.clone();
        let mut m: BTreeSet<u32> = keys.iter().copied().collect();

        for k in perm {
            assert_eq!(c.remove(&k), Ok(m.take(&k)));
            assert_eq!(c.len(), m.len());
            validate_store(&c);
            let got: Vec<u32> = c.iter().copied().collect();
            let expected: Vec<u32> = m.iter().copied().collect();
            assert_eq!(got, expected);
        }
        assert!(c.is_empty());
    });
}
