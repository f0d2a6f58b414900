//! # Logical Properties
//!
//! Logical properties describe *what* a relational expression produces, independent
//! of how it is executed. They are shared by every expression that computes the same
//! result, so they are derived once per node and then published behind an `Arc`.
//!
//! ## Contents
//!
//! - **Output columns**: the `ColSet` of column ids the expression produces.
//! - **Weak keys**: the minimal set of column sets on which no two non-null rows agree.
//!
//! ## Immutability After Publication
//!
//! A published `Arc<LogicalProperties>` may be referenced by several parents (a Sort
//! returns its child's record unchanged, for instance). Nothing mutates it afterwards;
//! derivation clones the `WeakKeys` it wants to extend.

use crate::colset::ColSet;
use crate::weak_keys::WeakKeys;
use serde::{Deserialize, Serialize};

/// Logical properties are derived from the logical content of an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalProperties {
    /// Output columns of this expression.
    pub output_columns: ColSet,
    /// Minimal weak keys over `output_columns`.
    pub weak_keys: WeakKeys,
}

impl LogicalProperties {
    pub fn new(output_columns: ColSet, weak_keys: WeakKeys) -> Self {
        Self {
            output_columns,
            weak_keys,
        }
    }

    /// True if `cols` is known to be a weak key of this expression, either
    /// directly or because one of the stored keys is a subset of it.
    pub fn is_weak_key(&self, cols: &ColSet) -> bool {
        self.weak_keys.contains_subset_of(cols)
    }

    /// True if the expression is known to produce at most one row.
    pub fn at_most_one_row(&self) -> bool {
        self.weak_keys.has_empty_key()
    }
}
