//! Whole-value operations on filter sets

use crate::types::{Dimension, FilterSet};
use std::collections::BTreeSet;

/// Right-biased merge: every dimension present in `b` replaces `a`'s value.
///
/// Set-valued dimensions are not unioned.
pub fn merge(a: &FilterSet, b: &FilterSet) -> FilterSet {
    let mut merged = a.clone();
    for (dimension, value) in b.iter() {
        // Both sides are already shape-checked, so the kind always matches.
        if merged.set(dimension, value.clone()).is_err() {
            merged.remove(dimension);
        }
    }
    merged
}

/// Dimensions whose values differ between `a` and `b`.
pub fn diff(a: &FilterSet, b: &FilterSet) -> BTreeSet<Dimension> {
    a.dimensions()
        .chain(b.dimensions())
        .filter(|dimension| a.get(*dimension) != b.get(*dimension))
        .collect()
}

/// Total number of selected values, used for badge counts.
///
/// Each distinct value counts once; an enabled flag counts as one.
pub fn counter(filters: &FilterSet) -> usize {
    filters.iter().map(|(_, value)| value.selected_count()).sum()
}
