//! # optx-props: Logical Properties for the Cascades Optimizer
//!
//! This crate maintains the uniqueness facts ("weak keys") the optimizer derives for
//! every relational expression, and derives them bottom-up over logical plans.
//!
//! ## Module Overview
//!
//! - **`colset`**: `ColumnId` and `ColSet`, the column-set primitive with subset tests.
//! - **`weak_keys`**: `WeakKeys`, a collection of column sets kept minimal under the
//!   subset order (no key is a superset of another).
//! - **`properties`**: `LogicalProperties`, the per-expression record holding output
//!   columns and weak keys.
//! - **`derive`**: `LogicalPropsBuilder`, per-operator derivation of logical properties.
//! - **`expr`**: Logical operator and scalar expression definitions.
//! - **`catalog`**: Catalog trait for declared primary and unique key constraints.

pub mod catalog;
pub mod colset;
pub mod derive;
pub mod expr;
pub mod properties;
pub mod weak_keys;

pub use colset::{ColSet, ColumnId};
pub use properties::LogicalProperties;
pub use weak_keys::WeakKeys;
