//! # Logical Property Derivation
//!
//! This module derives `LogicalProperties` bottom-up: each operator's properties are
//! computed from the operator itself and the already-published properties of its
//! children. The interesting part is the weak-key set, which every operator shapes
//! differently:
//!
//! - **Scan**: declared primary/unique constraints from the catalog, mapped onto the
//!   scanned column ids. Constraints over pruned columns are skipped.
//! - **Filter**: keeps the input keys. A conjunct `col = literal` pins `col` to a
//!   single value, so any key minus the pinned columns is still a key (possibly the
//!   empty key).
//! - **Project**: a key survives when all its columns are passed through.
//! - **Join**: every `left_key ∪ right_key` is a key. When the equi-join columns on one
//!   side cover one of its keys, each row of the *other* side matches at most once,
//!   so that side's keys are preserved as-is.
//! - **Aggregate**: the grouping columns form a key; a global aggregate has the
//!   empty key.
//! - **Limit**: `LIMIT 0` and `LIMIT 1` have the empty key.
//!
//! ## Sharing
//!
//! Children's properties arrive as `Arc<LogicalProperties>` and are never mutated.
//! Whenever derivation wants to extend a child's keys it clones them first. Sort,
//! Semi/Anti joins and wide Limits return the child's record itself.

use crate::catalog::Catalog;
use crate::colset::{ColSet, ColumnId};
use crate::expr::*;
use crate::properties::LogicalProperties;
use crate::weak_keys::WeakKeys;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Configuration knobs for property derivation.
pub struct PropsConfig {
    /// Upper bound on the `left_key ∪ right_key` candidates offered for a single join.
    /// Skipping candidates is always sound; it only loses guarantees.
    pub max_join_key_pairs: usize,
    /// Whether `col = literal` filter conjuncts shrink the input keys.
    pub derive_constant_keys: bool,
}

impl Default for PropsConfig {
    fn default() -> Self {
        Self {
            max_join_key_pairs: 64,
            derive_constant_keys: true,
        }
    }
}

/// Errors that can occur during property derivation.
#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    /// A Scan references a table the catalog does not know.
    #[error("Unknown table: {0}")]
    UnknownTable(TableRef),
    /// An operator was given the wrong number of child property records.
    #[error("{op} expects {expected} children, found {found}")]
    ChildCount {
        op: LogicalOpKind,
        expected: usize,
        found: usize,
    },
}

/// Builds logical properties for plan nodes.
pub struct LogicalPropsBuilder {
    /// Catalog providing declared key constraints for base tables.
    pub catalog: Arc<dyn Catalog>,
    pub config: PropsConfig,
}

impl LogicalPropsBuilder {
    pub fn new(catalog: Arc<dyn Catalog>, config: PropsConfig) -> Self {
        Self { catalog, config }
    }

    /// Derive properties for a whole plan tree, children first.
    pub fn build_plan(&self, plan: &LogicalPlan) -> Result<Arc<LogicalProperties>, DeriveError> {
        let children = plan
            .children
            .iter()
            .map(|child| self.build_plan(child))
            .collect::<Result<Vec<_>, _>>()?;
        self.build(&plan.op, &children)
    }

    /// Derive properties for one operator given its children's properties.
    pub fn build(
        &self,
        op: &LogicalOp,
        children: &[Arc<LogicalProperties>],
    ) -> Result<Arc<LogicalProperties>, DeriveError> {
        if children.len() != op.arity() {
            return Err(DeriveError::ChildCount {
                op: op.kind(),
                expected: op.arity(),
                found: children.len(),
            });
        }

        let props = match op {
            LogicalOp::Scan { table, columns } => self.build_scan(table, columns)?,
            LogicalOp::Filter { predicate } => self.build_filter(&children[0], predicate),
            LogicalOp::Project { items } => build_project(&children[0], items),
            LogicalOp::Join {
                join_type,
                condition,
            } => {
                if !join_type.outputs_right() {
                    trace!("{:?} join keeps left properties", join_type);
                    return Ok(Arc::clone(&children[0]));
                }
                self.build_join(*join_type, &children[0], &children[1], condition)
            }
            LogicalOp::Aggregate {
                group_by,
                aggregates,
            } => build_aggregate(&children[0], group_by, aggregates),
            LogicalOp::Sort { .. } => return Ok(Arc::clone(&children[0])),
            LogicalOp::Limit { count, .. } => {
                if *count > 1 {
                    return Ok(Arc::clone(&children[0]));
                }
                let mut weak_keys = WeakKeys::new();
                weak_keys.add(ColSet::new());
                LogicalProperties::new(children[0].output_columns.clone(), weak_keys)
            }
        };

        debug!(
            "Derived {} properties: columns={}, weak_keys={}",
            op.kind(),
            props.output_columns,
            props.weak_keys
        );
        Ok(Arc::new(props))
    }

    fn build_scan(
        &self,
        table: &TableRef,
        columns: &[ColumnRef],
    ) -> Result<LogicalProperties, DeriveError> {
        let constraints = self
            .catalog
            .get_table_keys(table)
            .ok_or_else(|| DeriveError::UnknownTable(table.clone()))?;

        let output_columns: ColSet = columns.iter().map(|c| c.id).collect();
        let mut weak_keys = WeakKeys::with_capacity(constraints.len());
        for constraint in &constraints {
            let key: Option<ColSet> = constraint
                .columns
                .iter()
                .map(|name| columns.iter().find(|c| &c.name == name).map(|c| c.id))
                .collect();
            match key {
                Some(key) => {
                    trace!("Scan {}: constraint '{}' gives key {}", table, constraint.name, key);
                    weak_keys.add(key);
                }
                None => trace!(
                    "Scan {}: constraint '{}' references pruned columns",
                    table,
                    constraint.name
                ),
            }
        }
        Ok(LogicalProperties::new(output_columns, weak_keys))
    }

    fn build_filter(&self, input: &LogicalProperties, predicate: &Expr) -> LogicalProperties {
        let mut weak_keys = input.weak_keys.clone();
        if self.config.derive_constant_keys {
            let constants = predicate.constant_columns();
            for key in input.weak_keys.iter().filter(|k| k.intersects(&constants)) {
                let reduced = key.difference(&constants);
                trace!("Filter pins {}: key {} reduces to {}", constants, key, reduced);
                weak_keys.add(reduced);
            }
        }
        LogicalProperties::new(input.output_columns.clone(), weak_keys)
    }

    fn build_join(
        &self,
        join_type: JoinType,
        left: &LogicalProperties,
        right: &LogicalProperties,
        condition: &Expr,
    ) -> LogicalProperties {
        // Rows whose left (resp. right) columns are all NULL-padded.
        let left_padded = matches!(join_type, JoinType::Right | JoinType::Full);
        let right_padded = matches!(join_type, JoinType::Left | JoinType::Full);

        let mut left_equated = ColSet::new();
        let mut right_equated = ColSet::new();
        for (a, b) in condition.column_equalities() {
            if let Some((l, r)) = orient(a, b, left, right) {
                left_equated.insert(l);
                right_equated.insert(r);
            }
        }

        // If the right columns equated to left columns contain a right key, every
        // left row matches at most one right row; symmetrically for the left side.
        // A preserved empty key is only sound when the other side adds no padded rows.
        let mut preserved = WeakKeys::new();
        if right.weak_keys.contains_subset_of(&right_equated) {
            trace!("Join: right key covered by {}, left keys preserved", right_equated);
            preserved = left
                .weak_keys
                .iter()
                .filter(|k| !(left_padded && k.is_empty()))
                .cloned()
                .collect();
        }
        if left.weak_keys.contains_subset_of(&left_equated) {
            trace!("Join: left key covered by {}, right keys preserved", left_equated);
            let right_keys: WeakKeys = right
                .weak_keys
                .iter()
                .filter(|k| !(right_padded && k.is_empty()))
                .cloned()
                .collect();
            preserved = preserved.combine(right_keys);
        }

        let mut weak_keys = preserved;
        let mut pairs = 0;
        'pairs: for lk in left.weak_keys.iter() {
            for rk in right.weak_keys.iter() {
                if pairs == self.config.max_join_key_pairs {
                    debug!(
                        "Join key pair limit ({}) reached, skipping remaining candidates",
                        self.config.max_join_key_pairs
                    );
                    break 'pairs;
                }
                pairs += 1;

                let key = lk.union(rk);
                // A FULL join of two single-row inputs can still produce two rows.
                if key.is_empty() && left_padded && right_padded {
                    continue;
                }
                if weak_keys.contains_subset_of(&key) {
                    trace!("Join: pair key {} already implied", key);
                    continue;
                }
                weak_keys.add(key);
            }
        }

        let output_columns = left.output_columns.union(&right.output_columns);
        LogicalProperties::new(output_columns, weak_keys)
    }
}

/// Orient an equality `a = b` as (left column, right column), if it spans both sides.
fn orient(
    a: ColumnId,
    b: ColumnId,
    left: &LogicalProperties,
    right: &LogicalProperties,
) -> Option<(ColumnId, ColumnId)> {
    if left.output_columns.contains(a) && right.output_columns.contains(b) {
        Some((a, b))
    } else if left.output_columns.contains(b) && right.output_columns.contains(a) {
        Some((b, a))
    } else {
        None
    }
}

fn build_project(input: &LogicalProperties, items: &[ProjectItem]) -> LogicalProperties {
    // Input column -> first output column that passes it through unchanged.
    let mut passthrough: HashMap<ColumnId, ColumnId> = HashMap::new();
    for item in items {
        if let Some(col) = item.expr.as_column() {
            passthrough.entry(col.id).or_insert(item.output.id);
        }
    }

    let output_columns: ColSet = items.iter().map(|item| item.output.id).collect();
    let mut weak_keys = WeakKeys::new();
    for key in input.weak_keys.iter() {
        let mapped: Option<ColSet> = key.iter().map(|c| passthrough.get(&c).copied()).collect();
        match mapped {
            Some(mapped) => weak_keys.add(mapped),
            None => trace!("Project drops key {}", key),
        }
    }
    LogicalProperties::new(output_columns, weak_keys)
}

fn build_aggregate(
    input: &LogicalProperties,
    group_by: &[Expr],
    aggregates: &[AggExpr],
) -> LogicalProperties {
    let mut output_columns: ColSet = group_by
        .iter()
        .filter_map(|e| e.as_column().map(|c| c.id))
        .collect();
    output_columns.extend(aggregates.iter().map(|agg| agg.output.id));

    let mut weak_keys = WeakKeys::new();
    let group_cols: Option<ColSet> = group_by
        .iter()
        .map(|e| e.as_column().map(|c| c.id))
        .collect();
    match group_cols {
        Some(group_cols) => {
            // Input keys within the grouping columns still hold: each group is one row.
            for key in input.weak_keys.iter().filter(|k| k.is_subset_of(&group_cols)) {
                weak_keys.add(key.clone());
            }
            if weak_keys.contains_subset_of(&group_cols) {
                trace!("Aggregate: grouping key {} already implied", group_cols);
            } else {
                weak_keys.add(group_cols);
            }
        }
        None => trace!("Aggregate groups on computed expressions; no key derived"),
    }
    LogicalProperties::new(output_columns, weak_keys)
}
