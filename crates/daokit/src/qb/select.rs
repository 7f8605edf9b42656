//! SELECT and aggregate statements.

use super::where_clause::{compile, compile_predicate};
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::query::Query;
use crate::registry::{FieldDescriptor, ModelRegistry};
use crate::value::Value;
use regex::Regex;
use std::sync::OnceLock;

fn select_expression() -> &'static Regex {
    static SELECT_EXPRESSION: OnceLock<Regex> = OnceLock::new();
    SELECT_EXPRESSION.get_or_init(|| {
        Regex::new(r"(?i)^(.+)\s+as\s+`?([a-zA-Z0-9_]+)`?\s*$")
            .expect("invalid built-in select expression regex")
    })
}

/// Column projection of a SELECT.
///
/// Each entry is a logical field name, a column name, or `<expr> as <Field>` where
/// `<Field>` names a mapped field and `<expr>` may use `@Field@` placeholders.
/// An empty projection selects every mapped field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOptions {
    fields: Vec<String>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the given entries, in order.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Select a comma separated list such as `"Id, Name"` or `"avg(@Num@) as Num"`.
    ///
    /// Commas inside parentheses do not split entries.
    pub fn field_list(self, list: &str) -> Self {
        let mut entries = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;
        for (i, ch) in list.char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    entries.push(list[start..i].trim().to_string());
                    start = i + 1;
                }
                _ => {}
            }
        }
        entries.push(list[start..].trim().to_string());
        entries.retain(|e| !e.is_empty());
        self.fields(entries)
    }

    pub fn entries(&self) -> &[String] {
        &self.fields
    }
}

/// A compiled SELECT plus the fields its result columns fill, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub sql: String,
    pub args: Vec<Value>,
    pub fields: Vec<FieldDescriptor>,
}

fn projection(
    registry: &ModelRegistry,
    opts: &SelectOptions,
) -> OrmResult<(String, Vec<FieldDescriptor>)> {
    if opts.entries().is_empty() {
        return Ok((registry.columns_sql().to_string(), registry.fields().to_vec()));
    }

    let mut sql = String::new();
    let mut fields = Vec::with_capacity(opts.entries().len());
    for (i, entry) in opts.entries().iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        if let Some(field) = registry.field(entry.trim()) {
            ident::push_quoted(&mut sql, &field.column);
            sql.push_str(" as ");
            ident::push_quoted(&mut sql, &field.name);
            fields.push(field.clone());
            continue;
        }

        let caps = select_expression()
            .captures(entry)
            .ok_or_else(|| OrmError::unknown_field(registry.table(), entry.as_str()))?;
        let field = registry.require(&caps[2])?;
        sql.push_str(&registry.resolve_placeholders(caps[1].trim()));
        sql.push_str(" as ");
        ident::push_quoted(&mut sql, &field.name);
        fields.push(field.clone());
    }
    Ok((sql, fields))
}

/// `select <projection> from `table` <where ... order by ... limit ...>`
pub fn select(
    registry: &ModelRegistry,
    opts: &SelectOptions,
    query: &Query,
) -> OrmResult<SelectStatement> {
    let (columns, fields) = projection(registry, opts)?;
    let compiled = compile(query, registry)?;

    let mut sql = format!("select {columns} from ");
    ident::push_quoted(&mut sql, registry.table());
    compiled.append_to(&mut sql);

    Ok(SelectStatement {
        sql,
        args: compiled.args,
        fields,
    })
}

/// `select <expr> from `table` [where ...]`
///
/// Only the predicate of `query` is used; ordering and pagination do not apply to
/// a single aggregate row.
pub fn aggregate(registry: &ModelRegistry, expr: &str, query: &Query) -> OrmResult<super::Statement> {
    let (predicate, args) = compile_predicate(query, registry)?;
    let mut sql = format!("select {expr} from ");
    ident::push_quoted(&mut sql, registry.table());
    if !predicate.is_empty() {
        sql.push_str(" where ");
        sql.push_str(&predicate);
    }
    Ok(super::Statement::new(sql, args))
}
