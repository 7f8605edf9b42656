//! Fluent condition-tree builder.
//!
//! A [`Query`] is a plain value: leaf conditions, nested child queries, an AND/OR
//! mode, ordering and pagination. Compiling it (see [`crate::qb::compile`]) never
//! mutates it, so the same tree can be compiled repeatedly or wrapped into several
//! parents.
//!
//! # Example
//!
//! ```ignore
//! use daokit::Query;
//!
//! // (name = ? and age > ?) or (name = ? and age > ?)
//! let q = Query::new()
//!     .or()
//!     .wrap(Query::new().eq("Name", "alice").gt("Age", 18))
//!     .wrap(Query::new().eq("Name", "bob").gt("Age", 21))
//!     .order_by("Id", true)
//!     .page(2, 40);
//! ```

use crate::condition::{Condition, Op, Operand, Order};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A boolean-combined, possibly nested set of conditions plus ordering and pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    conditions: Vec<Condition>,
    children: Vec<Query>,
    or: bool,
    order: Vec<Order>,
    offset: u64,
    limit: u64,
    unbounded: bool,
}

impl Query {
    /// Create an empty AND query.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, op: Op, field: impl Into<String>, operand: Operand) -> Self {
        self.conditions.push(Condition::new(op, field, operand));
        self
    }

    /// `field = value`
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Op::Eq, field, Operand::Value(value.into()))
    }

    /// `field <> value`
    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Op::Ne, field, Operand::Value(value.into()))
    }

    /// `field < value`
    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Op::Lt, field, Operand::Value(value.into()))
    }

    /// `field <= value`
    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Op::Lte, field, Operand::Value(value.into()))
    }

    /// `field > value`
    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Op::Gt, field, Operand::Value(value.into()))
    }

    /// `field >= value`
    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Op::Gte, field, Operand::Value(value.into()))
    }

    /// `field in (?, ?, ...)`. An empty set is rejected when compiling.
    pub fn in_list<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push(Op::In, field, Operand::List(values))
    }

    /// `field not in (?, ?, ...)`. An empty set is rejected when compiling.
    pub fn not_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push(Op::NotIn, field, Operand::List(values))
    }

    /// `field is null`
    pub fn is_null(self, field: impl Into<String>) -> Self {
        self.push(Op::IsNull, field, Operand::None)
    }

    /// `field is not null`
    pub fn is_not_null(self, field: impl Into<String>) -> Self {
        self.push(Op::IsNotNull, field, Operand::None)
    }

    /// `field like '%text%'`
    ///
    /// A leading wildcard prevents index usage.
    pub fn like(self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(Op::Like, field, Operand::Pattern(text.into()))
    }

    /// `field like 'text%'`
    pub fn starts_with(self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(Op::StartsWith, field, Operand::Pattern(text.into()))
    }

    /// `field like '%text'`
    ///
    /// A leading wildcard prevents index usage.
    pub fn ends_with(self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(Op::EndsWith, field, Operand::Pattern(text.into()))
    }

    /// Raw condition `<field> <expr>`.
    ///
    /// Both parts may reference fields as `@Field@`; unresolvable placeholders are
    /// kept verbatim. The text is not validated, so never build it from user input.
    ///
    /// ```ignore
    /// Query::new().expr("md5(@Name@)", "like concat(@Id@, '%')");
    /// ```
    pub fn expr(self, field: impl Into<String>, expr: impl Into<String>) -> Self {
        self.expr_with(field, expr, Vec::<Value>::new())
    }

    /// Raw condition whose `?` placeholders bind `args` in order.
    pub fn expr_with<I, V>(self, field: impl Into<String>, expr: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let operand = Operand::Expr {
            sql: expr.into(),
            args: args.into_iter().map(Into::into).collect(),
        };
        self.push(Op::Expr, field, operand)
    }

    /// Join this level's conditions and children with AND (the default).
    pub fn and(mut self) -> Self {
        self.or = false;
        self
    }

    /// Join this level's conditions and children with OR.
    pub fn or(mut self) -> Self {
        self.or = true;
        self
    }

    /// Append `child` as a parenthesized group.
    ///
    /// The child keeps its own AND/OR mode. Its ordering and pagination are ignored.
    pub fn wrap(mut self, child: Query) -> Self {
        self.children.push(child);
        self
    }

    /// Append an ordering directive; directives apply in insertion order.
    pub fn order_by(mut self, field: impl Into<String>, desc: bool) -> Self {
        self.order.push(Order {
            field: field.into(),
            desc,
        });
        self
    }

    /// `order_by(field, false)`
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.order_by(field, false)
    }

    /// `order_by(field, true)`
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, true)
    }

    /// Select page `page` (1-based) of `page_size` rows.
    ///
    /// Non-positive input, or a page whose offset overflows `u64`, leaves the query
    /// unchanged.
    pub fn page(mut self, page: i64, page_size: i64) -> Self {
        if page < 1 || page_size < 1 {
            tracing::warn!(target: "daokit.query", page, page_size, "ignoring illegal page");
            return self;
        }
        let Some(offset) = (page as u64 - 1).checked_mul(page_size as u64) else {
            tracing::warn!(target: "daokit.query", page, page_size, "ignoring page with overflowing offset");
            return self;
        };
        self.offset = offset;
        self.limit = page_size as u64;
        self.unbounded = false;
        self
    }

    /// Cap the number of returned rows. Non-positive input leaves the query unchanged.
    pub fn limit(mut self, limit: i64) -> Self {
        if limit < 1 {
            tracing::warn!(target: "daokit.query", limit, "ignoring illegal limit");
            return self;
        }
        self.limit = limit as u64;
        self.unbounded = false;
        self
    }

    /// Set offset and limit together.
    ///
    /// A negative offset or non-positive limit leaves the query unchanged.
    pub fn offset(mut self, offset: i64, limit: i64) -> Self {
        if offset < 0 || limit < 1 {
            tracing::warn!(target: "daokit.query", offset, limit, "ignoring illegal offset");
            return self;
        }
        self.offset = offset as u64;
        self.limit = limit as u64;
        self.unbounded = false;
        self
    }

    /// Explicitly request every matching row, suppressing any default limit.
    pub fn no_limit(mut self) -> Self {
        self.offset = 0;
        self.limit = 0;
        self.unbounded = true;
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn children(&self) -> &[Query] {
        &self.children
    }

    /// Whether this level joins with OR.
    pub fn is_or(&self) -> bool {
        self.or
    }

    pub fn orders(&self) -> &[Order] {
        &self.order
    }

    pub fn offset_value(&self) -> u64 {
        self.offset
    }

    /// Row cap; `0` means unset.
    pub fn limit_value(&self) -> u64 {
        self.limit
    }

    /// Whether [`no_limit`](Self::no_limit) was requested.
    pub fn is_unbounded(&self) -> bool {
        self.unbounded
    }

    /// Whether neither a limit nor `no_limit()` was set.
    pub fn limit_unset(&self) -> bool {
        self.limit == 0 && !self.unbounded
    }

    /// Same conditions and ordering without pagination.
    pub(crate) fn without_pagination(&self) -> Query {
        Query {
            offset: 0,
            limit: 0,
            unbounded: true,
            ..self.clone()
        }
    }

    /// Same tree capped at `limit` rows, keeping the offset.
    pub(crate) fn with_limit(&self, limit: u64) -> Query {
        Query {
            limit,
            unbounded: false,
            ..self.clone()
        }
    }
}
