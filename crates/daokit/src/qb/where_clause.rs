//! Condition compiler: [`Query`] → `where` / `order by` / `limit` fragment.

use crate::condition::{Condition, Op, Operand};
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::query::Query;
use crate::registry::ModelRegistry;
use crate::value::Value;

/// Output of [`compile`].
///
/// The three parts are kept apart so callers can check for an empty predicate
/// independently of ordering and pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compiled {
    /// Boolean predicate without the `where` keyword; empty when unconditional.
    pub predicate: String,
    /// `order by ...` or empty.
    pub order_by: String,
    /// `limit <offset>, <count>` or empty.
    pub limit: String,
    /// Arguments for every `?` in `predicate`, left to right.
    pub args: Vec<Value>,
}

impl Compiled {
    /// Whether the predicate is non-empty.
    pub fn has_where(&self) -> bool {
        !self.predicate.is_empty()
    }

    /// `where <predicate>` or empty.
    pub fn where_sql(&self) -> String {
        if self.predicate.is_empty() {
            String::new()
        } else {
            format!("where {}", self.predicate)
        }
    }

    /// The whole fragment: `where ... order by ... limit o, n`, omitting empty parts.
    pub fn to_sql(&self) -> String {
        let mut sql = self.where_sql();
        for part in [&self.order_by, &self.limit] {
            if part.is_empty() {
                continue;
            }
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str(part);
        }
        sql
    }

    /// Append ` <fragment>` to `sql` when the fragment is non-empty.
    pub(crate) fn append_to(&self, sql: &mut String) {
        let fragment = self.to_sql();
        if !fragment.is_empty() {
            sql.push(' ');
            sql.push_str(&fragment);
        }
    }
}

/// Compile a condition tree against a registry.
///
/// Fails when a field reference cannot be resolved or an `in` / `not in` set is
/// empty. Raw-expression placeholders that do not resolve are left untouched.
pub fn compile(query: &Query, registry: &ModelRegistry) -> OrmResult<Compiled> {
    let mut args = Vec::new();
    let predicate = render_group(query, registry, &mut args)?;

    let mut order_by = String::new();
    for (i, order) in query.orders().iter().enumerate() {
        order_by.push_str(if i == 0 { "order by " } else { ", " });
        ident::push_quoted(&mut order_by, &registry.require(&order.field)?.column);
        order_by.push_str(if order.desc { " desc" } else { " asc" });
    }

    let limit = if query.limit_value() > 0 {
        format!("limit {}, {}", query.offset_value(), query.limit_value())
    } else {
        String::new()
    };

    Ok(Compiled {
        predicate,
        order_by,
        limit,
        args,
    })
}

/// Compile only the predicate of `query`; ordering and pagination are ignored.
pub(crate) fn compile_predicate(
    query: &Query,
    registry: &ModelRegistry,
) -> OrmResult<(String, Vec<Value>)> {
    let mut args = Vec::new();
    let predicate = render_group(query, registry, &mut args)?;
    Ok((predicate, args))
}

fn render_group(query: &Query, registry: &ModelRegistry, args: &mut Vec<Value>) -> OrmResult<String> {
    let joiner = if query.is_or() { " or " } else { " and " };
    let mut sql = String::new();

    for cond in query.conditions() {
        if !sql.is_empty() {
            sql.push_str(joiner);
        }
        render_condition(cond, registry, &mut sql, args)?;
    }

    for child in query.children() {
        let inner = render_group(child, registry, args)?;
        if inner.is_empty() {
            continue;
        }
        if !sql.is_empty() {
            sql.push_str(joiner);
        }
        sql.push('(');
        sql.push_str(&inner);
        sql.push(')');
    }

    Ok(sql)
}

fn render_condition(
    cond: &Condition,
    registry: &ModelRegistry,
    sql: &mut String,
    args: &mut Vec<Value>,
) -> OrmResult<()> {
    if cond.op == Op::Expr {
        let Operand::Expr { sql: expr, args: expr_args } = &cond.operand else {
            return Err(OrmError::validation(format!(
                "expression condition on '{}' carries no expression",
                cond.field
            )));
        };
        if expr.trim().is_empty() {
            return Err(OrmError::validation(format!(
                "expression condition on '{}' is empty",
                cond.field
            )));
        }
        sql.push_str(&registry.resolve_placeholders(&cond.field));
        sql.push(' ');
        sql.push_str(&registry.resolve_placeholders(expr));
        args.extend(expr_args.iter().cloned());
        return Ok(());
    }

    let column = &registry.require(&cond.field)?.column;
    ident::push_quoted(sql, column);
    sql.push(' ');
    sql.push_str(cond.op.as_sql());

    match (cond.op, &cond.operand) {
        (Op::IsNull | Op::IsNotNull, _) => {}
        (Op::In | Op::NotIn, Operand::List(values)) => {
            if values.is_empty() {
                return Err(OrmError::EmptyInList {
                    field: cond.field.clone(),
                    op: cond.op.as_sql(),
                });
            }
            sql.push_str(" (");
            for i in 0..values.len() {
                sql.push_str(if i == 0 { "?" } else { ", ?" });
            }
            sql.push(')');
            args.extend(values.iter().cloned());
        }
        (Op::Like | Op::StartsWith | Op::EndsWith, Operand::Pattern(text)) => {
            let pattern = match cond.op {
                Op::StartsWith => format!("{text}%"),
                Op::EndsWith => format!("%{text}"),
                _ => format!("%{text}%"),
            };
            sql.push_str(" ?");
            args.push(Value::Text(pattern));
        }
        (_, Operand::Value(value)) => {
            sql.push_str(" ?");
            args.push(value.clone());
        }
        (op, operand) => {
            return Err(OrmError::validation(format!(
                "operator {op:?} on '{}' cannot take operand {operand:?}",
                cond.field
            )));
        }
    }
    Ok(())
}
