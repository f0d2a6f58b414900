//! # Expression and Operator Types
//!
//! This module defines the logical plan vocabulary the property layer derives
//! weak keys for. It is organized into two layers:
//!
//! ## Scalar Expressions (`Expr`)
//! Scalar expressions represent computations on individual rows: column references,
//! literal values, arithmetic operations, comparisons, boolean logic, and function calls.
//! They appear inside predicates, projections, join conditions, and sort keys. Key
//! derivation only looks at their *shape*: which conjuncts equate two columns, and
//! which equate a column to a constant.
//!
//! ## Logical Operators (`LogicalOp`)
//! Logical operators describe *what* to compute without specifying *how*. Each
//! operator contributes weak keys in its own way (a Scan from declared constraints,
//! an Aggregate from its grouping columns, a Join from both sides).
//!
//! ## Column Identity
//! Every `ColumnRef` carries a query-unique `ColumnId`. Names are for display only;
//! all set reasoning happens on ids.

use crate::colset::{ColSet, ColumnId};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reference to a table in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Reference to a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
    pub id: ColumnId,
}

impl ColumnRef {
    pub fn new(table: Option<&str>, name: impl Into<String>, id: u32) -> Self {
        Self {
            table: table.map(str::to_string),
            name: name.into(),
            id: ColumnId(id),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref t) = self.table {
            write!(f, "{}.{}", t, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Scalar value for expressions.
///
/// Uses `OrderedFloat` for `f64` so that floating-point values can be used as
/// hash map keys and in Eq/Hash comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScalarValue {
    /// SQL NULL value.
    Null,
    Bool(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
    /// Date as days since Unix epoch (1970-01-01).
    Date(i32),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int64(v) => v.hash(state),
            Self::Float64(v) => v.hash(state),
            Self::Utf8(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
        }
    }
}

/// Scalar expressions used in predicates, projections and join conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a column.
    Column(ColumnRef),
    /// Constant literal value.
    Literal(ScalarValue),
    /// Binary operation (e.g., `a + b`, `x = y`, `price > 100`).
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation (e.g., `NOT flag`, `-value`, `IS NULL`).
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Named function call (e.g., `UPPER(name)`, `ABS(value)`).
    Function {
        name: String,
        args: Vec<Expr>,
    },
    /// Conjunction (AND) of multiple predicates, stored flat.
    And(Vec<Expr>),
    /// Disjunction (OR) of multiple predicates.
    Or(Vec<Expr>),
}

impl Expr {
    pub fn column(col: &ColumnRef) -> Self {
        Expr::Column(col.clone())
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The referenced column if this expression is a bare column reference.
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(c) => Some(c),
            _ => None,
        }
    }

    /// Flatten AND-chains: (A AND (B AND C)) → [A, B, C].
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::And(exprs) => exprs.iter().flat_map(|e| e.conjuncts()).collect(),
            other => vec![other],
        }
    }

    /// Column pairs equated by a top-level conjunct `a = b`.
    pub fn column_equalities(&self) -> Vec<(ColumnId, ColumnId)> {
        self.conjuncts()
            .into_iter()
            .filter_map(|conjunct| match conjunct {
                Expr::BinaryOp {
                    op: BinaryOp::Eq,
                    left,
                    right,
                } => match (left.as_column(), right.as_column()) {
                    (Some(l), Some(r)) => Some((l.id, r.id)),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    /// Columns pinned to a single non-NULL value by a top-level conjunct
    /// `col = literal` (either orientation).
    pub fn constant_columns(&self) -> ColSet {
        self.conjuncts()
            .into_iter()
            .filter_map(|conjunct| match conjunct {
                Expr::BinaryOp {
                    op: BinaryOp::Eq,
                    left,
                    right,
                } => match (left.as_ref(), right.as_ref()) {
                    (Expr::Column(c), Expr::Literal(v)) | (Expr::Literal(v), Expr::Column(c))
                        if !v.is_null() =>
                    {
                        Some(c.id)
                    }
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }
}

/// Binary operators for comparison and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Equality comparison (`=`). The only operator key derivation inspects.
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

/// Unary operators for boolean logic and null checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// SQL join types.
///
/// Semi and Anti joins only emit left rows, so they keep the left side's keys
/// untouched. Every other join type can combine keys from both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Semi,
    Anti,
    Cross,
}

impl JoinType {
    /// Whether right-side columns appear in the join output.
    pub fn outputs_right(&self) -> bool {
        !matches!(self, JoinType::Semi | JoinType::Anti)
    }
}

/// Aggregate expression and the column it produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggExpr {
    pub func: AggFunc,
    pub arg: Expr,
    pub distinct: bool,
    pub output: ColumnRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub expr: Expr,
    pub ascending: bool,
    pub nulls_first: bool,
}

/// One output column of a projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectItem {
    pub expr: Expr,
    pub output: ColumnRef,
}

impl ProjectItem {
    /// Pass `col` through unchanged.
    pub fn passthrough(col: &ColumnRef) -> Self {
        Self {
            expr: Expr::column(col),
            output: col.clone(),
        }
    }
}

/// Logical operators -- represent *what* to compute, not *how*.
///
/// Children are not stored inline; see `LogicalPlan`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Table scan with optional column pruning. Always a leaf.
    Scan {
        table: TableRef,
        columns: Vec<ColumnRef>,
    },
    /// Filter: applies a predicate to its single child.
    Filter { predicate: Expr },
    /// Projection: computes a set of output columns from its child's columns.
    Project { items: Vec<ProjectItem> },
    /// Join: combines two child relations using the given join type and condition.
    Join { join_type: JoinType, condition: Expr },
    /// Aggregate: groups rows by `group_by` and computes aggregate functions.
    /// An empty `group_by` is a global aggregate producing exactly one row.
    Aggregate {
        group_by: Vec<Expr>,
        aggregates: Vec<AggExpr>,
    },
    /// Sort: orders the output by the given sort keys.
    Sort { order: Vec<SortKey> },
    /// Limit: returns at most `count` rows starting from `offset`.
    Limit { offset: u64, count: u64 },
}

/// Kind discriminant (without data), used in error reporting and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOpKind {
    Scan,
    Filter,
    Project,
    Join,
    Aggregate,
    Sort,
    Limit,
}

impl fmt::Display for LogicalOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl LogicalOp {
    pub fn kind(&self) -> LogicalOpKind {
        match self {
            LogicalOp::Scan { .. } => LogicalOpKind::Scan,
            LogicalOp::Filter { .. } => LogicalOpKind::Filter,
            LogicalOp::Project { .. } => LogicalOpKind::Project,
            LogicalOp::Join { .. } => LogicalOpKind::Join,
            LogicalOp::Aggregate { .. } => LogicalOpKind::Aggregate,
            LogicalOp::Sort { .. } => LogicalOpKind::Sort,
            LogicalOp::Limit { .. } => LogicalOpKind::Limit,
        }
    }

    /// Number of children this operator expects.
    pub fn arity(&self) -> usize {
        match self {
            LogicalOp::Scan { .. } => 0,
            LogicalOp::Join { .. } => 2,
            _ => 1,
        }
    }
}

/// A logical plan tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalPlan {
    pub op: LogicalOp,
    pub children: Vec<LogicalPlan>,
}

impl LogicalPlan {
    pub fn leaf(op: LogicalOp) -> Self {
        Self {
            op,
            children: vec![],
        }
    }

    pub fn unary(op: LogicalOp, child: LogicalPlan) -> Self {
        Self {
            op,
            children: vec![child],
        }
    }

    pub fn binary(op: LogicalOp, left: LogicalPlan, right: LogicalPlan) -> Self {
        Self {
            op,
            children: vec![left, right],
        }
    }
}
