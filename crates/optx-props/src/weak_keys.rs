//! # Weak Keys
//!
//! A weak key is a set of columns such that no two distinct rows agree on every
//! column of the set, *ignoring rows in which any of those columns is NULL*. Weak
//! keys certify uniqueness facts the optimizer can exploit: dropping redundant
//! joins, simplifying `DISTINCT`, proving at-most-one-row results.
//!
//! ## Minimality
//!
//! A key collection is only useful when it is an **antichain** under the subset
//! order: if `(a)` is a key then `(a,b)` is trivially a key too and carries no
//! extra information. `WeakKeys` maintains that invariant across every mutation:
//!
//! - `add` refuses a key already implied by a stored subset, and evicts every
//!   stored superset of a new key.
//! - `combine` merges two antichains by re-adding one into the other.
//!
//! The empty key `()` is a subset of every key. Adding it evicts everything else
//! and leaves `{()}`, which states that the relation has at most one row.
//!
//! ## Sharing
//!
//! Once a `WeakKeys` is stored inside a published `LogicalProperties` record it
//! is shared behind an `Arc` and must not be mutated. `Clone` is the copy
//! boundary: clone first, then `add`.

use crate::colset::ColSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimal collection of weak keys.
///
/// Element order is the insertion order of the surviving keys. It carries no
/// meaning, but it is deterministic, which keeps plan output reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<ColSet>", into = "Vec<ColSet>")]
pub struct WeakKeys {
    keys: Vec<ColSet>,
}

impl WeakKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColSet> {
        self.keys.iter()
    }

    /// Exact membership (not implication; see `contains_subset_of`).
    pub fn contains_key(&self, key: &ColSet) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// True when the empty key is stored, i.e. the relation has at most one row.
    pub fn has_empty_key(&self) -> bool {
        self.keys.iter().any(|k| k.is_empty())
    }

    /// Returns true if some stored key is a subset of (or equal to) `candidate`.
    ///
    /// In that case the uniqueness guarantee `candidate` would provide is already
    /// implied, and `add(candidate)` would leave the collection unchanged.
    pub fn contains_subset_of(&self, candidate: &ColSet) -> bool {
        self.keys.iter().any(|existing| existing.is_subset_of(candidate))
    }

    /// Add a key, keeping the collection minimal.
    ///
    /// If a stored key is a subset of `new_key` the call is a no-op and the
    /// storage is left exactly as it was. Otherwise every stored superset of
    /// `new_key` is dropped, the survivors keep their relative order, and
    /// `new_key` is appended.
    ///
    /// Because the stored keys already form an antichain, `new_key` is either
    /// dominated (first case) or dominates zero or more stored keys; one pass of
    /// each is enough.
    pub fn add(&mut self, new_key: ColSet) {
        if self.contains_subset_of(&new_key) {
            return;
        }
        self.keys.retain(|existing| !new_key.is_subset_of(existing));
        self.keys.push(new_key);
    }

    /// Merge two minimal collections into the minimal collection of their union.
    ///
    /// Both inputs are consumed. When either side is empty the other one is
    /// returned as-is, without copying; since ownership moves, the result never
    /// shares storage with anything the caller still holds.
    pub fn combine(mut self, other: WeakKeys) -> WeakKeys {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        self.keys.reserve(other.len());
        for key in other.keys {
            self.add(key);
        }
        self
    }
}

impl From<Vec<ColSet>> for WeakKeys {
    fn from(keys: Vec<ColSet>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<WeakKeys> for Vec<ColSet> {
    fn from(keys: WeakKeys) -> Self {
        keys.keys
    }
}

impl FromIterator<ColSet> for WeakKeys {
    fn from_iter<T: IntoIterator<Item = ColSet>>(iter: T) -> Self {
        let mut keys = WeakKeys::new();
        keys.extend(iter);
        keys
    }
}

impl Extend<ColSet> for WeakKeys {
    fn extend<T: IntoIterator<Item = ColSet>>(&mut self, iter: T) {
        for key in iter {
            self.add(key);
        }
    }
}

impl IntoIterator for WeakKeys {
    type Item = ColSet;
    type IntoIter = std::vec::IntoIter<ColSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl<'a> IntoIterator for &'a WeakKeys {
    type Item = &'a ColSet;
    type IntoIter = std::slice::Iter<'a, ColSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Formats as `{(1,2), (3)}`.
impl fmt::Display for WeakKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", key)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn cs(ids: &[u32]) -> ColSet {
        ColSet::from_ids(ids.iter().copied())
    }

    fn keys(sets: &[&[u32]]) -> WeakKeys {
        let mut wk = WeakKeys::new();
        for ids in sets {
            wk.add(cs(ids));
        }
        wk
    }

    fn as_set(wk: &WeakKeys) -> BTreeSet<ColSet> {
        wk.iter().cloned().collect()
    }

    fn is_antichain(wk: &WeakKeys) -> bool {
        let v: Vec<_> = wk.iter().collect();
        for (i, a) in v.iter().enumerate() {
            for (j, b) in v.iter().enumerate() {
                if i != j && a.is_subset_of(b) {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_contains_subset_of() {
        let wk = keys(&[&[1, 2], &[3]]);
        assert!(wk.contains_subset_of(&cs(&[1, 2])));
        assert!(wk.contains_subset_of(&cs(&[1, 2, 4])));
        assert!(wk.contains_subset_of(&cs(&[3, 4])));
        assert!(!wk.contains_subset_of(&cs(&[1])));
        assert!(!wk.contains_subset_of(&cs(&[])));
        assert!(!WeakKeys::new().contains_subset_of(&cs(&[1])));
    }

    #[test]
    fn test_add_smaller_key_evicts_superset() {
        let mut wk = keys(&[&[1, 2]]);
        wk.add(cs(&[1]));
        assert_eq!(wk, keys(&[&[1]]));
    }

    #[test]
    fn test_add_larger_key_is_redundant() {
        let mut wk = keys(&[&[1]]);
        wk.add(cs(&[1, 2]));
        assert_eq!(wk, keys(&[&[1]]));
    }

    #[test]
    fn test_add_evicts_multiple_and_keeps_order() {
        let mut wk = keys(&[&[1, 2], &[3, 4], &[1, 5], &[6]]);
        wk.add(cs(&[1]));
        let got: Vec<_> = wk.iter().cloned().collect();
        assert_eq!(got, vec![cs(&[3, 4]), cs(&[6]), cs(&[1])]);
    }

    #[test]
    fn test_redundant_add_leaves_storage_untouched() {
        // (4) is the last key scanned and makes (1,4) redundant.
        let mut wk = keys(&[&[1, 2, 3], &[5], &[4]]);
        let before: Vec<_> = wk.iter().cloned().collect();
        wk.add(cs(&[1, 4]));
        let after: Vec<_> = wk.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut wk = keys(&[&[1, 2], &[3]]);
        wk.add(cs(&[2, 4]));
        let once = wk.clone();
        wk.add(cs(&[2, 4]));
        assert_eq!(wk, once);
    }

    #[test]
    fn test_empty_key_absorbs_everything() {
        let mut wk = keys(&[&[1, 2], &[3], &[4, 5, 6]]);
        wk.add(ColSet::new());
        assert_eq!(wk, keys(&[&[]]));
        assert!(wk.has_empty_key());

        // Nothing can be added after the empty key.
        wk.add(cs(&[7]));
        assert_eq!(wk.len(), 1);
    }

    #[test]
    fn test_combine_identity() {
        let x = keys(&[&[1, 2], &[3]]);
        assert_eq!(WeakKeys::new().combine(x.clone()), x);
        assert_eq!(x.clone().combine(WeakKeys::new()), x);
        assert!(WeakKeys::new().combine(WeakKeys::new()).is_empty());
    }

    #[test]
    fn test_combine_minimality() {
        let merged = keys(&[&[1]]).combine(keys(&[&[2]]));
        assert_eq!(as_set(&merged), as_set(&keys(&[&[1], &[2]])));

        let merged = keys(&[&[1, 2]]).combine(keys(&[&[1]]));
        assert_eq!(merged, keys(&[&[1]]));
    }

    #[test]
    fn test_clone_is_independent() {
        let source = keys(&[&[1, 2], &[3]]);
        let mut copy = source.clone();
        copy.add(cs(&[1]));
        assert_eq!(source, keys(&[&[1, 2], &[3]]));
        assert_eq!(as_set(&copy), as_set(&keys(&[&[1], &[3]])));

        let mut source = source;
        let copy = source.clone();
        source.add(ColSet::new());
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn test_from_iterator_minimizes() {
        let wk: WeakKeys = vec![cs(&[1, 2]), cs(&[1, 2]), cs(&[2]), cs(&[3, 4])]
            .into_iter()
            .collect();
        assert_eq!(as_set(&wk), as_set(&keys(&[&[2], &[3, 4]])));
    }

    #[test]
    fn test_deserialize_minimizes() {
        let wk: WeakKeys = serde_json::from_str("[[1,2],[1],[3],[3]]").unwrap();
        assert_eq!(wk, keys(&[&[1], &[3]]));
        assert_eq!(serde_json::to_string(&wk).unwrap(), "[[1],[3]]");
    }

    #[test]
    fn test_display() {
        assert_eq!(keys(&[&[2, 1], &[3]]).to_string(), "{(1,2), (3)}");
        assert_eq!(WeakKeys::new().to_string(), "{}");
    }

    fn arb_colset() -> impl Strategy<Value = ColSet> {
        prop::collection::btree_set(0u32..6, 0..4).prop_map(|ids| ColSet::from_ids(ids))
    }

    fn arb_keys() -> impl Strategy<Value = WeakKeys> {
        prop::collection::vec(arb_colset(), 0..8).prop_map(WeakKeys::from)
    }

    proptest! {
        #[test]
        fn prop_add_preserves_antichain(mut wk in arb_keys(), key in arb_colset()) {
            prop_assert!(is_antichain(&wk));
            wk.add(key.clone());
            prop_assert!(is_antichain(&wk));
            prop_assert!(wk.contains_subset_of(&key));
        }

        #[test]
        fn prop_contains_subset_of_iff_add_is_noop(wk in arb_keys(), key in arb_colset()) {
            let mut added = wk.clone();
            added.add(key.clone());
            prop_assert_eq!(wk.contains_subset_of(&key), added == wk);
        }

        #[test]
        fn prop_combine_is_order_invariant(a in arb_keys(), b in arb_keys()) {
            let ab = a.clone().combine(b.clone());
            let ba = b.combine(a);
            prop_assert!(is_antichain(&ab));
            prop_assert_eq!(as_set(&ab), as_set(&ba));
        }

        #[test]
        fn prop_combine_implies_both_inputs(a in arb_keys(), b in arb_keys()) {
            let merged = a.clone().combine(b.clone());
            for key in a.iter().chain(b.iter()) {
                prop_assert!(merged.contains_subset_of(key));
            }
            for key in merged.iter() {
                prop_assert!(a.contains_key(key) || b.contains_key(key));
            }
        }
    }
}
