//! Full-row and entry-based UPDATE statements.

use super::Statement;
use super::where_clause::compile;
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::query::Query;
use crate::registry::ModelRegistry;
use crate::value::Value;

/// `update `t` set `a` = ?, `b` = ? where `id` = ? [and `pk2` = ?]`
///
/// Bind with [`update_row_args`]: non-key values first, then key values.
pub fn update_row_sql(registry: &ModelRegistry) -> OrmResult<String> {
    let mut set = String::new();
    let mut keys = String::new();
    for field in registry.fields() {
        let buf = if field.primary { &mut keys } else { &mut set };
        if !buf.is_empty() {
            buf.push_str(if field.primary { " and " } else { ", " });
        }
        ident::push_quoted(buf, &field.column);
        buf.push_str(" = ?");
    }
    if set.is_empty() {
        return Err(OrmError::validation(format!(
            "table '{}' has no non-key column to update",
            registry.table()
        )));
    }

    let mut sql = String::from("update ");
    ident::push_quoted(&mut sql, registry.table());
    sql.push_str(" set ");
    sql.push_str(&set);
    sql.push_str(" where ");
    sql.push_str(&keys);
    Ok(sql)
}

/// Reorder a flattened row (registry field order) to match [`update_row_sql`].
pub fn update_row_args(registry: &ModelRegistry, values: Vec<Value>) -> Vec<Value> {
    let mut args = Vec::with_capacity(values.len());
    let mut keys = Vec::with_capacity(registry.primary_count());
    for (field, value) in registry.fields().iter().zip(values) {
        if field.primary {
            keys.push(value);
        } else {
            args.push(value);
        }
    }
    args.extend(keys);
    args
}

/// One `set` clause of a partial update: a literal value or a raw expression.
///
/// ```ignore
/// UpdateEntry::value("Name", "alice");
/// UpdateEntry::increase("LoginCount", 1);
/// UpdateEntry::expr("Score", "@Score@ * ?").args([2]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEntry {
    pub field: String,
    pub value: Option<Value>,
    /// Raw SQL with `@Field@` placeholders. Never build it from user input.
    pub expr: Option<String>,
    /// Arguments for `?` placeholders inside `expr`.
    pub args: Vec<Value>,
}

impl UpdateEntry {
    /// `` `field` = ? `` bound to `value`.
    pub fn value(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: Some(value.into()),
            expr: None,
            args: Vec::new(),
        }
    }

    /// `` `field` = <expr> ``
    pub fn expr(field: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: None,
            expr: Some(expr.into()),
            args: Vec::new(),
        }
    }

    /// `` `field` = `field` + step ``
    pub fn increase(field: impl Into<String>, step: i64) -> Self {
        let field = field.into();
        let expr = format!("@{field}@ + {step}");
        Self::expr(field, expr)
    }

    /// Bind arguments for the expression's own placeholders.
    pub fn args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Render the `set` list for `entries`, appending arguments in placeholder order.
fn set_clause(
    registry: &ModelRegistry,
    entries: &[UpdateEntry],
    args: &mut Vec<Value>,
) -> OrmResult<String> {
    if entries.is_empty() {
        return Err(OrmError::validation(format!(
            "update of '{}' has no entries",
            registry.table()
        )));
    }
    let mut sql = String::new();
    for entry in entries {
        let field = registry.require(&entry.field)?;
        if !sql.is_empty() {
            sql.push_str(", ");
        }
        ident::push_quoted(&mut sql, &field.column);
        sql.push_str(" = ");
        match (&entry.value, &entry.expr) {
            (Some(value), _) => {
                sql.push('?');
                args.push(value.clone());
            }
            (None, Some(expr)) if !expr.trim().is_empty() => {
                sql.push_str(&registry.resolve_placeholders(expr));
                args.extend(entry.args.iter().cloned());
            }
            _ => return Err(OrmError::InvalidUpdateEntry(entry.field.clone())),
        }
    }
    Ok(sql)
}

fn update_head(registry: &ModelRegistry, entries: &[UpdateEntry]) -> OrmResult<Statement> {
    let mut args = Vec::new();
    let set = set_clause(registry, entries, &mut args)?;
    let mut sql = String::from("update ");
    ident::push_quoted(&mut sql, registry.table());
    sql.push_str(" set ");
    sql.push_str(&set);
    Ok(Statement::new(sql, args))
}

/// `update `t` set ... where ...`; an empty predicate is rejected.
///
/// Ordering and `limit` from `query` are passed through.
pub fn update_by(registry: &ModelRegistry, query: &Query, entries: &[UpdateEntry]) -> OrmResult<Statement> {
    let compiled = compile(query, registry)?;
    if !compiled.has_where() {
        return Err(OrmError::UnconditionalMutation("update"));
    }
    let mut stmt = update_head(registry, entries)?;
    compiled.append_to(&mut stmt.sql);
    stmt.args.extend(compiled.args);
    Ok(stmt)
}

/// `update `t` set ...` over every row.
pub fn update_all(registry: &ModelRegistry, entries: &[UpdateEntry]) -> OrmResult<Statement> {
    update_head(registry, entries)
}
