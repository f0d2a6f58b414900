//! # Catalog Interface
//!
//! The catalog provides the property layer with the metadata that seeds weak keys:
//! for each table, its declared key constraints (primary key and unique constraints).
//!
//! ## Trait Design
//!
//! The `Catalog` trait is intentionally minimal and behind a trait object (`dyn Catalog`)
//! so that different backends can provide metadata. For testing and development, the
//! `InMemoryCatalog` provides a simple HashMap-based implementation that can be
//! populated programmatically.
//!
//! ## Column Names vs. Column Ids
//!
//! Constraints name columns, they do not carry `ColumnId`s. Ids are allocated per
//! query, so the same table scanned twice yields two unrelated id sets; the Scan
//! derivation maps constraint names onto the ids of the scanned columns.

use crate::expr::TableRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of declared key constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    Primary,
    Unique,
}

/// A declared key constraint, by column name.
///
/// A unique constraint over nullable columns is still a valid *weak* key: rows
/// with a NULL in any key column are exempt from the uniqueness guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyConstraint {
    pub name: String,
    pub kind: KeyKind,
    pub columns: Vec<String>,
}

impl KeyConstraint {
    pub fn primary(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: KeyKind::Primary,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: KeyKind::Unique,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Catalog provides key-constraint information.
///
/// `None` means the table is unknown; `Some(vec![])` means a known table without
/// declared keys.
pub trait Catalog: Send + Sync {
    fn get_table_keys(&self, table: &TableRef) -> Option<Vec<KeyConstraint>>;
}

/// In-memory catalog for testing and development.
///
/// Tables are keyed by their fully-qualified name (`schema.table`).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    /// Declared key constraints keyed by "schema.table".
    pub table_keys: HashMap<String, Vec<KeyConstraint>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: &TableRef, keys: Vec<KeyConstraint>) {
        self.table_keys.insert(table.to_string(), keys);
    }
}

impl Catalog for InMemoryCatalog {
    fn get_table_keys(&self, table: &TableRef) -> Option<Vec<KeyConstraint>> {
        self.table_keys.get(&table.to_string()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_qualified_name() {
        let mut catalog = InMemoryCatalog::new();
        let orders = TableRef::new("tpch", "orders");
        catalog.add_table(
            &orders,
            vec![KeyConstraint::primary("orders_pk", &["o_orderkey"])],
        );

        let keys = catalog.get_table_keys(&orders).unwrap_or_default();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].kind, KeyKind::Primary);

        assert!(catalog.get_table_keys(&TableRef::new("tpcds", "orders")).is_none());
    }
}
