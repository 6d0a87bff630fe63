//! The Range Dictionary: the public surface layered on top of the ordered
//! store.

use std::cmp::Ordering;
use std::fmt;

use crate::entry::{Entry, EntryView};
use crate::order::{KeyOrder, NaturalEq, NaturalOrder, ValueEq};
use crate::resolve::resolve;
use crate::store::{Addr, OrderedStore};

/// Maps half-open key intervals `[begin, end)` to values, keeping stored
/// intervals non-overlapping and coalesced whenever neighbors carry equal
/// values.
///
/// `C` and `E` let a caller supply a comparator and an equality relation
/// that differ from `K`'s and `V`'s own `Ord`/`PartialEq` impls; the
/// [`RangeDict::new`] / [`RangeDict::with_capacity`] constructors cover the
/// common case where the natural ones are what you want.
pub struct RangeDict<K, V, C = NaturalOrder, E = NaturalEq> {
    store: OrderedStore<K, V>,
    key_cmp: C,
    value_eq: E,
    bounds: Option<(K, K)>,
}

impl<K, V> RangeDict<K, V, NaturalOrder, NaturalEq>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    pub fn new() -> Self {
        Self::with_comparators(NaturalOrder, NaturalEq)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_comparators_and_capacity(NaturalOrder, NaturalEq, capacity)
    }
}

impl<K, V> Default for RangeDict<K, V, NaturalOrder, NaturalEq>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, E> RangeDict<K, V, C, E>
where
    K: Clone,
    V: Clone,
    C: KeyOrder<K>,
    E: ValueEq<V>,
{
    pub fn with_comparators(key_cmp: C, value_eq: E) -> Self {
        RangeDict { store: OrderedStore::new(), key_cmp, value_eq, bounds: None }
    }

    pub fn with_comparators_and_capacity(key_cmp: C, value_eq: E, capacity: usize) -> Self {
        RangeDict { store: OrderedStore::with_capacity(capacity), key_cmp, value_eq, bounds: None }
    }

    /// Removes every entry and resets bounds to "unset".
    pub fn clear(&mut self) {
        self.store.clear();
        self.bounds = None;
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// `None` when empty, else `(min begin, max end)` over all stored
    /// entries.
    pub fn bounds(&self) -> Option<(K, K)> {
        self.bounds.clone()
    }

    /// Ascending-by-`begin` view of the stored entries.
    pub fn iter(&self) -> impl Iterator<Item = EntryView<'_, K, V>> {
        self.store.iter().map(EntryView::from)
    }

    /// Inserts `[begin, end) -> value`, reconciling it against every
    /// pre-existing entry so that the store stays non-overlapping and
    /// coalesced.
    ///
    /// Panics if `begin` does not precede `end` under the comparator.
    pub fn mark(&mut self, begin: K, end: K, value: V) {
        assert!(
            self.key_cmp.compare(&begin, &end) == Ordering::Less,
            "mark: begin must precede end"
        );
        let candidate = Entry::new(begin, end, value);

        match self.store.len() {
            0 => self.mark_into_empty(candidate),
            1 => self.mark_into_singleton(candidate),
            _ => self.mark_general(candidate),
        }

        #[cfg(debug_assertions)]
        self.assert_invariants();
    }

    fn mark_into_empty(&mut self, candidate: Entry<K, V>) {
        self.bounds = Some((candidate.begin.clone(), candidate.end.clone()));
        self.store.insert(&self.key_cmp, candidate);
    }

    fn mark_into_singleton(&mut self, mut candidate: Entry<K, V>) {
        let only_addr: Addr = 0;
        let res = self.resolve_at(only_addr, &mut candidate, false);
        if let Some(trailing) = res.split_trailing {
            // The cursor was shrunk to a left remainder; candidate and the
            // trailing right remainder are both new entries.
            self.store.insert(&self.key_cmp, candidate);
            self.store.insert(&self.key_cmp, trailing);
        } else if !res.absorbed {
            self.store.insert(&self.key_cmp, candidate);
        }
        self.recompute_bounds();
    }

    fn mark_general(&mut self, mut candidate: Entry<K, V>) {
        let (bounds_begin, bounds_end) = self.bounds.clone().expect("bounds set when store is non-empty");

        // 3a. Bounds fast paths.
        if self.key_cmp.compare(&candidate.begin, &bounds_end) == Ordering::Greater {
            self.bounds = Some((bounds_begin, candidate.end.clone()));
            self.store.insert(&self.key_cmp, candidate);
            return;
        }
        if self.key_cmp.compare(&candidate.end, &bounds_begin) == Ordering::Less {
            self.bounds = Some((candidate.begin.clone(), bounds_end));
            self.store.insert(&self.key_cmp, candidate);
            return;
        }
        if self.key_cmp.compare(&candidate.begin, &bounds_begin) != Ordering::Greater
            && self.key_cmp.compare(&candidate.end, &bounds_end) != Ordering::Less
        {
            self.store.clear();
            self.bounds = Some((candidate.begin.clone(), candidate.end.clone()));
            self.store.insert(&self.key_cmp, candidate);
            return;
        }

        let mut inserted = false;
        let mut entry_addr: Option<Addr> = None;

        // b. Left merge.
        match self.store.find_previous(&self.key_cmp, &candidate.begin, true) {
            Some(prev_addr) => {
                let res = self.resolve_at(prev_addr, &mut candidate, false);
                if let Some(trailing) = res.split_trailing {
                    // The cursor at `prev_addr` was shrunk to a left
                    // remainder, not turned into the candidate's home.
                    let addr = self.store.insert(&self.key_cmp, candidate.clone());
                    self.store.insert(&self.key_cmp, trailing);
                    inserted = true;
                    entry_addr = Some(addr);
                } else if res.absorbed {
                    inserted = true;
                    entry_addr = Some(prev_addr);
                    let new_begin = self.store.get(prev_addr).begin.clone();
                    if self.key_cmp.compare(&new_begin, &bounds_begin) == Ordering::Less {
                        self.bounds.as_mut().unwrap().0 = new_begin;
                    }
                }
            }
            None => {
                self.bounds.as_mut().unwrap().0 = candidate.begin.clone();
            }
        }

        // c. Forward propagation loop.
        loop {
            let search_key = match entry_addr {
                Some(addr) => self.store.get(addr).begin.clone(),
                None => candidate.begin.clone(),
            };
            let Some(victim_addr) = self.store.find_next(&self.key_cmp, &search_key, false) else {
                break;
            };

            if inserted {
                let cursor_addr = entry_addr.unwrap();
                let mut cursor_copy = self.store.get(cursor_addr).clone();
                let mut victim_copy = self.store.get(victim_addr).clone();
                let res = resolve(&self.key_cmp, &self.value_eq, &mut cursor_copy, &mut victim_copy, true);
                if res.absorbed {
                    *self.store.get_mut(cursor_addr) = cursor_copy;
                    self.store.remove_at(victim_addr);
                    if res.stop {
                        break;
                    }
                } else {
                    *self.store.get_mut(victim_addr) = victim_copy;
                    break;
                }
            } else {
                let mut victim_copy = self.store.get(victim_addr).clone();
                let res = resolve(&self.key_cmp, &self.value_eq, &mut victim_copy, &mut candidate, true);
                *self.store.get_mut(victim_addr) = victim_copy;
                if res.absorbed {
                    inserted = true;
                    entry_addr = Some(victim_addr);
                } else {
                    break;
                }
                if res.stop {
                    break;
                }
            }
        }

        if !inserted {
            let addr = self.store.insert(&self.key_cmp, candidate);
            entry_addr = Some(addr);
        }
        let final_end = self.store.get(entry_addr.unwrap()).end.clone();
        if self.key_cmp.compare(&final_end, &self.bounds.as_ref().unwrap().1) == Ordering::Greater {
            self.bounds.as_mut().unwrap().1 = final_end;
        }
    }

    /// Clones the stored entry at `addr` out, resolves it against
    /// `candidate`, writes the (possibly mutated) entry back, and returns
    /// the outcome. Keeps the borrow checker out of `Resolve`'s way.
    fn resolve_at(
        &mut self,
        addr: Addr,
        candidate: &mut Entry<K, V>,
        reversed: bool,
    ) -> crate::resolve::Resolution<K, V> {
        let mut cursor = self.store.get(addr).clone();
        let res = resolve(&self.key_cmp, &self.value_eq, &mut cursor, candidate, reversed);
        *self.store.get_mut(addr) = cursor;
        res
    }

    fn recompute_bounds(&mut self) {
        let mut iter = self.store.iter();
        self.bounds = iter.next().map(|first| {
            let mut lo = first.begin.clone();
            let mut hi = first.end.clone();
            for e in iter {
                if self.key_cmp.compare(&e.begin, &lo) == Ordering::Less {
                    lo = e.begin.clone();
                }
                if self.key_cmp.compare(&e.end, &hi) == Ordering::Greater {
                    hi = e.end.clone();
                }
            }
            (lo, hi)
        });
    }

    #[cfg(debug_assertions)]
    fn assert_invariants(&self) {
        let mut prev: Option<&Entry<K, V>> = None;
        for e in self.store.iter() {
            debug_assert!(
                self.key_cmp.compare(&e.begin, &e.end) == Ordering::Less,
                "stored entry must have begin < end"
            );
            if let Some(p) = prev {
                debug_assert!(
                    self.key_cmp.compare(&p.end, &e.begin) != Ordering::Greater,
                    "stored entries must not overlap"
                );
                if self.key_cmp.compare(&p.end, &e.begin) == Ordering::Equal {
                    debug_assert!(
                        !self.value_eq.eq(&p.value, &e.value),
                        "touching entries must not hold equal values"
                    );
                }
            }
            prev = Some(e);
        }
        match (&self.bounds, self.store.is_empty()) {
            (None, true) => {}
            (Some((lo, hi)), false) => {
                let mut iter = self.store.iter();
                let first = iter.next().unwrap();
                let mut expected_lo = first.begin.clone();
                let mut expected_hi = first.end.clone();
                for e in iter {
                    if self.key_cmp.compare(&e.begin, &expected_lo) == Ordering::Less {
                        expected_lo = e.begin.clone();
                    }
                    if self.key_cmp.compare(&e.end, &expected_hi) == Ordering::Greater {
                        expected_hi = e.end.clone();
                    }
                }
                debug_assert!(self.key_cmp.compare(lo, &expected_lo) == Ordering::Equal, "bounds.begin drifted");
                debug_assert!(self.key_cmp.compare(hi, &expected_hi) == Ordering::Equal, "bounds.end drifted");
            }
            _ => debug_assert!(false, "bounds presence must track store emptiness"),
        }
    }
}

impl<K, V, C, E> fmt::Display for RangeDict<K, V, C, E>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: KeyOrder<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<&Entry<K, V>> = self.store.iter().collect();
        let Some(first) = entries.first() else { return Ok(()) };
        write!(f, "[{:?}..({:?})..{:?}", first.begin, first.value, first.end)?;
        for pair in entries.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            if self.key_cmp.compare(&prev.end, &cur.begin) == Ordering::Equal {
                write!(f, "|{:?}..({:?})..{:?}", cur.begin, cur.value, cur.end)?;
            } else {
                write!(f, ") [{:?}..({:?})..{:?}", cur.begin, cur.value, cur.end)?;
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views(d: &RangeDict<i32, char>) -> Vec<(i32, i32, char)> {
        d.iter().map(|v| (*v.begin, *v.end, *v.value)).collect()
    }

    #[test]
    fn scenario_1_first_mark() {
        let mut d = RangeDict::new();
        d.mark(0, 1, 'A');
        assert_eq!(views(&d), vec![(0, 1, 'A')]);
        assert_eq!(d.bounds(), Some((0, 1)));
    }

    #[test]
    fn scenario_2_disjoint_append() {
        let mut d = RangeDict::new();
        d.mark(0, 1, 'A');
        d.mark(2, 3, 'B');
        assert_eq!(views(&d), vec![(0, 1, 'A'), (2, 3, 'B')]);
        assert_eq!(d.bounds(), Some((0, 3)));
    }

    #[test]
    fn scenario_3_cover_everything() {
        let mut d = RangeDict::new();
        d.mark(4, 5, 'A');
        d.mark(0, 10, 'B');
        assert_eq!(views(&d), vec![(0, 10, 'B')]);
        assert_eq!(d.bounds(), Some((0, 10)));
    }

    #[test]
    fn scenario_4_strict_containment_splits() {
        let mut d = RangeDict::new();
        d.mark(0, 10, 'A');
        d.mark(4, 5, 'B');
        assert_eq!(views(&d), vec![(0, 4, 'A'), (4, 5, 'B'), (5, 10, 'A')]);
        assert_eq!(d.bounds(), Some((0, 10)));
    }

    #[test]
    fn scenario_5_overlap_both_sides() {
        let mut d = RangeDict::new();
        d.mark(2, 4, 'A');
        d.mark(6, 8, 'B');
        d.mark(3, 7, 'C');
        assert_eq!(views(&d), vec![(2, 3, 'A'), (3, 7, 'C'), (7, 8, 'B')]);
        assert_eq!(d.bounds(), Some((2, 8)));
    }

    #[test]
    fn scenario_6_many_small_entries_replaced() {
        let mut d = RangeDict::new();
        let values = ['A', 'B', 'A', 'B', 'A', 'B', 'A', 'B', 'Y'];
        for (i, v) in values.iter().enumerate() {
            d.mark(i as i32 + 1, i as i32 + 2, *v);
        }
        d.mark(0, 10, 'Z');
        assert_eq!(views(&d), vec![(0, 10, 'Z')]);
        assert_eq!(d.bounds(), Some((0, 10)));
    }

    #[test]
    fn scenario_7_same_value_touching_coalesces() {
        let mut d = RangeDict::new();
        d.mark(0, 5, 'A');
        d.mark(5, 10, 'A');
        assert_eq!(views(&d), vec![(0, 10, 'A')]);
    }

    #[test]
    fn scenario_8_different_value_touching_does_not_coalesce() {
        let mut d = RangeDict::new();
        d.mark(0, 5, 'A');
        d.mark(5, 10, 'B');
        assert_eq!(views(&d), vec![(0, 5, 'A'), (5, 10, 'B')]);
    }

    #[test]
    fn mark_is_idempotent() {
        let mut d = RangeDict::new();
        d.mark(2, 4, 'A');
        d.mark(6, 8, 'B');
        d.mark(3, 7, 'C');
        let once = views(&d);
        d.mark(3, 7, 'C');
        assert_eq!(views(&d), once);
    }

    #[test]
    fn clear_resets_bounds_and_entries() {
        let mut d = RangeDict::new();
        d.mark(0, 1, 'A');
        d.clear();
        assert_eq!(d.len(), 0);
        assert_eq!(d.bounds(), None);
    }

    #[test]
    fn mark_rejects_empty_interval() {
        let mut d: RangeDict<i32, char> = RangeDict::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| d.mark(5, 5, 'A')));
        assert!(result.is_err());
    }

    #[test]
    fn debug_string_marks_touching_and_separated_runs() {
        let mut d = RangeDict::new();
        d.mark(0, 5, 'A');
        d.mark(5, 8, 'B');
        d.mark(10, 12, 'C');
        assert_eq!(format!("{d}"), "[0..('A')..5|5..('B')..8) [10..('C')..12)");
    }
}
