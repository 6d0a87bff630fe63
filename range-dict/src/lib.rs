//! An in-memory ordered range dictionary.
//!
//! Maps half-open key intervals `[begin, end)` to values through a single
//! mutating primitive, [`RangeDict::mark`], which reconciles a newly
//! inserted interval against every pre-existing one so that the stored
//! intervals stay pairwise non-overlapping and coalesced whenever adjacent
//! intervals hold equal values.
//!
//! The dictionary is synchronous, single-threaded, and self-contained: it
//! consumes only a total order on keys and an equality relation on values,
//! and performs no I/O. Wrap an instance in an external mutex for shared
//! access; it holds no internal locks.

mod dict;
mod entry;
mod order;
mod resolve;
mod store;

pub use dict::RangeDict;
pub use entry::EntryView;
pub use order::{KeyOrder, NaturalEq, NaturalOrder, ValueEq};
