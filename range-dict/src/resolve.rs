//! The single reconciliation primitive both the left-merge step and the
//! forward propagation loop in [`crate::dict::RangeDict::mark`] call into.
//!
//! `resolve` takes a stored entry (`cursor`) and the interval being
//! inserted (`candidate`) and mutates one or both of them in place to
//! restore the non-overlap and coalescing invariants for that pair. It
//! never touches the store directly — the caller applies `Resolution` by
//! inserting, removing, or simply trusting the in-place mutation, which
//! keeps this function free of any notion of addresses.
//!
//! `reversed` distinguishes the two directions `mark` calls it from:
//! `false` when `candidate`'s insertion point sits at or to the right of
//! `cursor` (the one-shot left-merge step), `true` when `candidate` is
//! propagating forward against a `cursor` that follows it.

use crate::entry::Entry;
use crate::order::{KeyOrder, ValueEq};
use std::cmp::Ordering::*;

/// Outcome of a single `cursor`/`candidate` pairing.
pub struct Resolution<K, V> {
    /// The candidate was folded into the cursor (or, in the reversed phase,
    /// the cursor was folded away). The caller must not separately insert
    /// the candidate.
    pub absorbed: bool,
    /// No further store entries can possibly overlap; the caller's scan
    /// should stop even if it would otherwise continue.
    pub stop: bool,
    /// Set only by the strict-containment split (different value,
    /// `reversed = false`): the caller must also insert this entry.
    pub split_trailing: Option<Entry<K, V>>,
}

impl<K, V> Resolution<K, V> {
    fn absorbed(stop: bool) -> Self {
        Resolution { absorbed: true, stop, split_trailing: None }
    }

    fn not_absorbed(stop: bool) -> Self {
        Resolution { absorbed: false, stop, split_trailing: None }
    }

    fn split(trailing: Entry<K, V>, stop: bool) -> Self {
        Resolution { absorbed: true, stop, split_trailing: Some(trailing) }
    }
}

pub fn resolve<K, V>(
    key_cmp: &impl KeyOrder<K>,
    value_eq: &impl ValueEq<V>,
    cursor: &mut Entry<K, V>,
    candidate: &mut Entry<K, V>,
    reversed: bool,
) -> Resolution<K, V>
where
    K: Clone,
    V: Clone,
{
    let begin_cmp = key_cmp.compare(&cursor.begin, &candidate.begin);

    if value_eq.eq(&cursor.value, &candidate.value) {
        return resolve_same_value(key_cmp, cursor, candidate, begin_cmp);
    }
    resolve_different_value(key_cmp, cursor, candidate, begin_cmp, reversed)
}

fn resolve_same_value<K, V>(
    key_cmp: &impl KeyOrder<K>,
    cursor: &mut Entry<K, V>,
    candidate: &mut Entry<K, V>,
    begin_cmp: std::cmp::Ordering,
) -> Resolution<K, V>
where
    K: Clone,
{
    match begin_cmp {
        Equal => {
            if key_cmp.compare(&cursor.end, &candidate.end) == Less {
                cursor.end = candidate.end.clone();
            }
            Resolution::absorbed(false)
        }
        Less => {
            if key_cmp.compare(&cursor.end, &candidate.begin) == Less {
                Resolution::not_absorbed(false)
            } else {
                if key_cmp.compare(&cursor.end, &candidate.end) == Less {
                    cursor.end = candidate.end.clone();
                }
                Resolution::absorbed(false)
            }
        }
        Greater => {
            if key_cmp.compare(&candidate.end, &cursor.begin) == Less {
                Resolution::not_absorbed(false)
            } else {
                cursor.begin = candidate.begin.clone();
                if key_cmp.compare(&cursor.end, &candidate.end) == Less {
                    cursor.end = candidate.end.clone();
                }
                Resolution::absorbed(false)
            }
        }
    }
}

fn resolve_different_value<K, V>(
    key_cmp: &impl KeyOrder<K>,
    cursor: &mut Entry<K, V>,
    candidate: &mut Entry<K, V>,
    begin_cmp: std::cmp::Ordering,
    reversed: bool,
) -> Resolution<K, V>
where
    K: Clone,
    V: Clone,
{
    match begin_cmp {
        Equal => {
            if key_cmp.compare(&cursor.end, &candidate.end) != Greater {
                let stop = key_cmp.compare(&cursor.end, &candidate.end) == Equal;
                cursor.begin = candidate.begin.clone();
                cursor.end = candidate.end.clone();
                cursor.value = candidate.value.clone();
                Resolution::absorbed(stop)
            } else {
                cursor.begin = candidate.end.clone();
                Resolution::not_absorbed(true)
            }
        }
        Less => {
            if key_cmp.compare(&cursor.end, &candidate.begin) != Greater {
                // disjoint or touching
                Resolution::not_absorbed(true)
            } else if key_cmp.compare(&candidate.end, &cursor.end) == Less {
                // candidate strictly contained in cursor
                if !reversed {
                    let trailing =
                        Entry::new(candidate.end.clone(), cursor.end.clone(), cursor.value.clone());
                    cursor.end = candidate.begin.clone();
                    Resolution::split(trailing, true)
                } else {
                    // the stored entry bound to `candidate` here is wholly
                    // inside `cursor`'s range; caller deletes it.
                    Resolution::absorbed(false)
                }
            } else {
                // overlap at end
                if !reversed {
                    cursor.end = candidate.begin.clone();
                    Resolution::not_absorbed(false)
                } else if key_cmp.compare(&cursor.end, &candidate.end) == Equal {
                    Resolution::absorbed(true)
                } else {
                    candidate.begin = cursor.end.clone();
                    Resolution::not_absorbed(true)
                }
            }
        }
        Greater => {
            if key_cmp.compare(&candidate.end, &cursor.begin) != Greater {
                // disjoint or touching
                Resolution::not_absorbed(true)
            } else if key_cmp.compare(&cursor.end, &candidate.end) != Greater {
                // candidate covers cursor entirely
                cursor.begin = candidate.begin.clone();
                cursor.end = candidate.end.clone();
                cursor.value = candidate.value.clone();
                Resolution::absorbed(false)
            } else {
                // partial overlap: the pre-existing cursor always yields
                // the overlapping span to the candidate, forward scan or not
                cursor.begin = candidate.end.clone();
                Resolution::not_absorbed(true)
            }
        }
    }
}
