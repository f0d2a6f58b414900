//! # Column Sets
//!
//! A `ColSet` is an immutable-by-convention set of column identifiers. It is the
//! currency of the logical-property layer: weak keys, output columns and
//! constant columns are all expressed as column sets.
//!
//! ## Column Identity
//!
//! Columns are identified by `ColumnId`, a small integer that is unique within a
//! single query. The identifiers are allocated by whoever builds the logical
//! plan (the planner or a test); this module never allocates them. Two scans of
//! the same table therefore carry *different* column ids, which is what lets a
//! self-join keep the keys of both sides apart.
//!
//! ## Representation
//!
//! The set is backed by a `BTreeSet`, so iteration is always in ascending id
//! order and the type is `Ord + Hash`. Weak-key collections are bounded by the
//! column count of a relation, so the O(k) subset test is never a bottleneck.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Query-unique identifier of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(pub u32);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ColumnId {
    fn from(id: u32) -> Self {
        ColumnId(id)
    }
}

/// A set of column identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColSet(BTreeSet<ColumnId>);

impl ColSet {
    /// The empty column set. As a weak key it means "at most one row".
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(col: ColumnId) -> Self {
        let mut set = Self::new();
        set.insert(col);
        set
    }

    /// Build a set from raw ids. Mostly a convenience for tests and catalogs.
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        ids.into_iter().map(ColumnId).collect()
    }

    pub fn insert(&mut self, col: ColumnId) -> bool {
        self.0.insert(col)
    }

    pub fn contains(&self, col: ColumnId) -> bool {
        self.0.contains(&col)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.0.iter().copied()
    }

    /// True if every column of `self` is also in `other`. Equal sets are subsets
    /// of each other, and the empty set is a subset of everything.
    pub fn is_subset_of(&self, other: &ColSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn union(&self, other: &ColSet) -> ColSet {
        ColSet(self.0.union(&other.0).copied().collect())
    }

    pub fn difference(&self, other: &ColSet) -> ColSet {
        ColSet(self.0.difference(&other.0).copied().collect())
    }

    pub fn intersects(&self, other: &ColSet) -> bool {
        self.0.intersection(&other.0).next().is_some()
    }
}

impl FromIterator<ColumnId> for ColSet {
    fn from_iter<T: IntoIterator<Item = ColumnId>>(iter: T) -> Self {
        ColSet(BTreeSet::from_iter(iter))
    }
}

impl Extend<ColumnId> for ColSet {
    fn extend<T: IntoIterator<Item = ColumnId>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ColSet {
    type Item = ColumnId;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, ColumnId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

/// Formats as `(1,2,3)`; the empty set is `()`.
impl fmt::Display for ColSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, col) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", col)?;
        }
        write!(f, ")")
    }
}
