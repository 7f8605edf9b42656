//! Leaf conditions and ordering directives of a [`Query`](crate::Query).

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Comparison operator of a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// `like '%v%'`; defeats index usage.
    Like,
    /// `like 'v%'`
    StartsWith,
    /// `like '%v'`; defeats index usage.
    EndsWith,
    IsNull,
    IsNotNull,
    In,
    NotIn,
    /// Raw expression escape: `<field> <expr>` with `@Field@` substitution.
    Expr,
}

impl Op {
    /// SQL keyword or symbol. Empty for [`Op::Expr`], which carries its own text.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Like | Op::StartsWith | Op::EndsWith => "like",
            Op::IsNull => "is null",
            Op::IsNotNull => "is not null",
            Op::In => "in",
            Op::NotIn => "not in",
            Op::Expr => "",
        }
    }
}

/// Right-hand side of a leaf condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Null tests bind nothing.
    None,
    Value(Value),
    /// Set membership; one placeholder per element.
    List(Vec<Value>),
    /// LIKE family; wildcards are added when compiling.
    Pattern(String),
    /// Raw expression with arguments for its own `?` placeholders.
    Expr { sql: String, args: Vec<Value> },
}

/// A single comparison: operator, field reference and operand.
///
/// `field` is a logical name or a column; for [`Op::Expr`] it is free text that may
/// contain `@Field@` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub op: Op,
    pub field: String,
    pub operand: Operand,
}

impl Condition {
    pub fn new(op: Op, field: impl Into<String>, operand: Operand) -> Self {
        Self {
            op,
            field: field.into(),
            operand,
        }
    }
}

/// One `order by` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub field: String,
    pub desc: bool,
}
