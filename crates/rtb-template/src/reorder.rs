//! Ordered-list reordering
//!
//! Moves one element of a list to a new index. Out-of-range indices are a
//! no-op rather than an error: drag events race with removals, and a stale
//! index must never corrupt the list.

/// Move the element at `from` to `to`, returning a new list
///
/// The result is a permutation of `list`: the moved element lands at `to`
/// and all other elements keep their relative order. Out-of-range indices
/// return an unchanged copy.
#[must_use]
pub fn reorder<T: Clone>(list: &[T], from: usize, to: usize) -> Vec<T> {
    let mut out = list.to_vec();
    reorder_in_place(&mut out, from, to);
    out
}

/// Move the element at `from` to `to` in place
///
/// Returns `true` when the list changed.
pub fn reorder_in_place<T>(list: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= list.len() || to >= list.len() || from == to {
        return false;
    }
    let item = list.remove(from);
    list.insert(to, item);
    true
}
