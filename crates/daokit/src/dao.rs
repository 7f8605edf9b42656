//! Typed data access object.
//!
//! A [`Dao`] binds one model type to one table. It is built once (registration
//! failures surface here) and then shared; every operation takes an explicit
//! [`ExecContext`] carrying the executor and, optionally, an ambient transaction.
//!
//! # Example
//!
//! ```ignore
//! use daokit::{Dao, DaoConfig, ExecContext, InsertOptions, Query, SelectOptions};
//!
//! let users = Dao::<UserInfo>::new(DaoConfig::new())?;
//! let ctx = ExecContext::new(&executor);
//!
//! let (_, id) = users.insert(&ctx, &user, InsertOptions::new()).await?;
//! let recent = users
//!     .select(&ctx, &Query::new().gt("last_login", cutoff).desc("id"), &SelectOptions::new())
//!     .await?;
//! users.delete(&ctx, [id]).await?;
//! ```

use crate::client::{ExecResult, Executor};
use crate::config::DaoConfig;
use crate::context::ExecContext;
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::model::{FieldType, Model};
use crate::qb::{self, InsertOptions, SelectOptions, UpdateEntry};
use crate::query::Query;
use crate::registry::{FieldDescriptor, ModelRegistry};
use crate::row::{Row, flatten, materialize};
use crate::value::{FromValue, Value};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

/// Result of `sum`, typed after the summed field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_i64(self) -> i64 {
        match self {
            Number::Int(v) => v,
            Number::Float(v) => v as i64,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }
}

/// Outcome of [`Dao::batch_insert`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInsert {
    /// Total affected rows over every statement that succeeded.
    pub affected: u64,
    /// Generated id per input row; `None` for skipped rows or when none was reported.
    pub ids: Vec<Option<u64>>,
}

/// Data access object for model `M`.
pub struct Dao<M: Model> {
    registry: Arc<ModelRegistry>,
    config: DaoConfig,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for Dao<M> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> std::fmt::Debug for Dao<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dao")
            .field("model", &M::NAME)
            .field("table", &self.registry.table())
            .field("config", &self.config)
            .finish()
    }
}

impl<M: Model> Dao<M> {
    /// Register `M` and build its DAO.
    pub fn new(config: DaoConfig) -> OrmResult<Self> {
        let registry = ModelRegistry::of::<M>(config.table.as_deref())?;
        Ok(Self {
            registry: Arc::new(registry),
            config,
            _model: PhantomData,
        })
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Shared handle to the registry, for compiling statements outside the DAO.
    pub fn shared_registry(&self) -> Arc<ModelRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    fn single_primary(&self, op: &str) -> OrmResult<&FieldDescriptor> {
        let mut keys = self.registry.primaries();
        match (keys.next(), keys.next()) {
            (Some(key), None) => Ok(key),
            _ => Err(OrmError::validation(format!(
                "{op} needs a single primary key, table '{}' has {}",
                self.registry.table(),
                self.registry.primary_count()
            ))),
        }
    }

    async fn fetch<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        kind: &'static str,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<Vec<Row>> {
        tracing::debug!(
            target: "daokit.sql",
            kind,
            table = %self.registry.table(),
            param_count = args.len(),
            sql = %sql,
        );
        ctx.or_timeout(self.config.query_timeout).query(sql, args).await
    }

    async fn exec<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        kind: &'static str,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<ExecResult> {
        tracing::debug!(
            target: "daokit.sql",
            kind,
            table = %self.registry.table(),
            param_count = args.len(),
            sql = %sql,
        );
        ctx.or_timeout(self.config.query_timeout).execute(sql, args).await
    }

    fn skip_row(&self, kind: &'static str, index: usize, error: &OrmError) {
        tracing::warn!(
            target: "daokit.sql",
            kind,
            table = %self.registry.table(),
            row = index,
            error = %error,
            "skipping row",
        );
    }

    // ==================== Reads ====================

    /// Rows matching `query`, restricted to `opts`' projection.
    ///
    /// A query that neither sets a limit nor calls `no_limit()` is capped at
    /// [`DaoConfig::default_limit`]. Rows that fail to materialize are skipped.
    pub async fn select<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        query: &Query,
        opts: &SelectOptions,
    ) -> OrmResult<Vec<M>> {
        let query = match self.config.default_limit {
            Some(limit) if query.limit_unset() => Cow::Owned(query.with_limit(limit)),
            _ => Cow::Borrowed(query),
        };
        let stmt = qb::select(&self.registry, opts, &query)?;
        let rows = self.fetch(ctx, "select", &stmt.sql, &stmt.args).await?;

        let mut out = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            match materialize::<M>(&stmt.fields, row) {
                Ok(model) => out.push(model),
                Err(e) => self.skip_row("select", i, &e),
            }
        }
        Ok(out)
    }

    /// Rows where `field = value`, capped at `limit` (non-positive: default limit).
    pub async fn select_by<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        field: &str,
        value: impl Into<Value>,
        limit: i64,
    ) -> OrmResult<Vec<M>> {
        let query = Query::new().eq(field, value).limit(limit);
        self.select(ctx, &query, &SelectOptions::new()).await
    }

    /// Row with primary key `id`. Only for single-key models.
    pub async fn select_one<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        id: impl Into<Value>,
    ) -> OrmResult<Option<M>> {
        let key = self.single_primary("select_one")?;
        let query = Query::new().eq(key.name.as_str(), id);
        self.select_one_by_query(ctx, &query, &SelectOptions::new()).await
    }

    /// First row where `field = value`.
    pub async fn select_one_by<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        field: &str,
        value: impl Into<Value>,
    ) -> OrmResult<Option<M>> {
        let query = Query::new().eq(field, value);
        self.select_one_by_query(ctx, &query, &SelectOptions::new()).await
    }

    /// First row matching `query`; its limit is forced to one row.
    pub async fn select_one_by_query<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        query: &Query,
        opts: &SelectOptions,
    ) -> OrmResult<Option<M>> {
        let rows = self.select(ctx, &query.with_limit(1), opts).await?;
        Ok(rows.into_iter().next())
    }

    // ==================== Aggregates ====================

    async fn aggregate<E: Executor, T: FromValue>(
        &self,
        ctx: &ExecContext<'_, E>,
        expr: &str,
        query: &Query,
    ) -> OrmResult<Option<T>> {
        let stmt = qb::aggregate(&self.registry, expr, query)?;
        let rows = self.fetch(ctx, "aggregate", &stmt.sql, &stmt.args).await?;
        match rows.first() {
            Some(row) => row.try_get::<Option<T>>(0),
            None => Ok(None),
        }
    }

    /// `count(*)` over rows matching `query`; pagination is ignored.
    pub async fn count<E: Executor>(&self, ctx: &ExecContext<'_, E>, query: &Query) -> OrmResult<u64> {
        Ok(self.aggregate(ctx, "count(*)", query).await?.unwrap_or(0))
    }

    /// Number of rows where `field = value`.
    pub async fn count_by<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        field: &str,
        value: impl Into<Value>,
    ) -> OrmResult<u64> {
        self.count(ctx, &Query::new().eq(field, value)).await
    }

    /// Sum of `field` over rows matching `query`.
    ///
    /// Integer fields yield [`Number::Int`], float fields [`Number::Float`]; any other
    /// declared type is rejected before anything runs. An empty match sums to zero.
    pub async fn sum<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        field: &str,
        query: &Query,
    ) -> OrmResult<Number> {
        let field = self.registry.require(field)?;
        let expr = format!("sum({})", ident::quote(&field.column));
        match field.kind {
            FieldType::Integer => {
                let v: Option<i64> = self.aggregate(ctx, &expr, query).await?;
                Ok(Number::Int(v.unwrap_or(0)))
            }
            FieldType::Float => {
                let v: Option<f64> = self.aggregate(ctx, &expr, query).await?;
                Ok(Number::Float(v.unwrap_or(0.0)))
            }
            other => Err(OrmError::validation(format!(
                "cannot sum field '{}' of type {other:?}",
                field.name
            ))),
        }
    }

    /// Average of `field` over rows matching `query`; zero for an empty match.
    pub async fn avg<E: Executor>(&self, ctx: &ExecContext<'_, E>, field: &str, query: &Query) -> OrmResult<f64> {
        let field = self.registry.require(field)?;
        let expr = format!("avg({})", ident::quote(&field.column));
        Ok(self.aggregate(ctx, &expr, query).await?.unwrap_or(0.0))
    }

    // ==================== Inserts ====================

    /// Insert one row, returning the affected count and the generated id.
    pub async fn insert<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        row: &M,
        opts: InsertOptions,
    ) -> OrmResult<(u64, Option<u64>)> {
        let args = flatten(&self.registry, row)?;
        let sql = qb::insert_sql(&self.registry, opts, 1)?;
        let res = self.exec(ctx, "insert", &sql, &args).await?;
        Ok((res.affected, res.last_insert_id))
    }

    /// Insert rows one statement at a time.
    ///
    /// A row that fails to flatten or to execute is logged and skipped; the others
    /// still go in. Runs inside the ambient transaction, or in one of its own.
    pub async fn batch_insert<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        rows: &[M],
        opts: InsertOptions,
    ) -> OrmResult<BatchInsert> {
        let mut out = BatchInsert {
            affected: 0,
            ids: vec![None; rows.len()],
        };
        if rows.is_empty() {
            return Ok(out);
        }
        let sql = qb::insert_sql(&self.registry, opts, 1)?;

        let owned = match ctx.txn() {
            Some(_) => None,
            None => Some(ctx.or_timeout(self.config.query_timeout).begin().await?),
        };
        let run = match &owned {
            Some(txn) => ctx.with_txn(txn),
            None => *ctx,
        };

        for (i, row) in rows.iter().enumerate() {
            let args = match flatten(&self.registry, row) {
                Ok(args) => args,
                Err(e) => {
                    self.skip_row("insert", i, &e);
                    continue;
                }
            };
            match self.exec(&run, "insert", &sql, &args).await {
                Ok(res) => {
                    out.affected += res.affected;
                    out.ids[i] = res.last_insert_id;
                }
                Err(e) => self.skip_row("insert", i, &e),
            }
        }

        if let Some(txn) = owned {
            ctx.or_timeout(self.config.query_timeout).commit(txn).await?;
        }
        Ok(out)
    }

    /// Insert rows with a single multi-row statement.
    ///
    /// Rows that fail to flatten are logged and left out. Nothing runs when no row
    /// is left.
    pub async fn insert_many<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        rows: &[M],
        opts: InsertOptions,
    ) -> OrmResult<ExecResult> {
        let mut args = Vec::with_capacity(rows.len() * self.registry.fields().len());
        let mut count = 0;
        for (i, row) in rows.iter().enumerate() {
            match flatten(&self.registry, row) {
                Ok(values) => {
                    args.extend(values);
                    count += 1;
                }
                Err(e) => self.skip_row("insert", i, &e),
            }
        }
        if count == 0 {
            return Ok(ExecResult::default());
        }
        let sql = qb::insert_sql(&self.registry, opts, count)?;
        self.exec(ctx, "insert", &sql, &args).await
    }

    // ==================== Updates ====================

    /// Overwrite every non-key column of the row with the same primary key.
    pub async fn update<E: Executor>(&self, ctx: &ExecContext<'_, E>, row: &M) -> OrmResult<u64> {
        let sql = qb::update_row_sql(&self.registry)?;
        let args = qb::update_row_args(&self.registry, flatten(&self.registry, row)?);
        Ok(self.exec(ctx, "update", &sql, &args).await?.affected)
    }

    /// Full-row update of each row, skipping (and logging) rows that fail.
    ///
    /// Runs inside the ambient transaction, or in one of its own.
    pub async fn batch_update<E: Executor>(&self, ctx: &ExecContext<'_, E>, rows: &[M]) -> OrmResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let sql = qb::update_row_sql(&self.registry)?;

        let owned = match ctx.txn() {
            Some(_) => None,
            None => Some(ctx.or_timeout(self.config.query_timeout).begin().await?),
        };
        let run = match &owned {
            Some(txn) => ctx.with_txn(txn),
            None => *ctx,
        };

        let mut affected = 0;
        for (i, row) in rows.iter().enumerate() {
            let values = match flatten(&self.registry, row) {
                Ok(values) => values,
                Err(e) => {
                    self.skip_row("update", i, &e);
                    continue;
                }
            };
            let args = qb::update_row_args(&self.registry, values);
            match self.exec(&run, "update", &sql, &args).await {
                Ok(res) => affected += res.affected,
                Err(e) => self.skip_row("update", i, &e),
            }
        }

        if let Some(txn) = owned {
            ctx.or_timeout(self.config.query_timeout).commit(txn).await?;
        }
        Ok(affected)
    }

    /// Apply `entries` to rows matching `query`. A query without conditions is rejected.
    pub async fn update_by<E: Executor>(
        &self,
        ctx: &ExecContext<'_, E>,
        query: &Query,
        entries: &[UpdateEntry],
    ) -> OrmResult<u64> {
        let stmt = qb::update_by(&self.registry, query, entries)?;
        Ok(self.exec(ctx, "update", &stmt.sql, &stmt.args).await?.affected)
    }

    /// Apply `entries` to every row of the table.
    pub async fn update_all<E: Executor>(&self, ctx: &ExecContext<'_, E>, entries: &[UpdateEntry]) -> OrmResult<u64> {
        let stmt = qb::update_all(&self.registry, entries)?;
        Ok(self.exec(ctx, "update", &stmt.sql, &stmt.args).await?.affected)
    }

    // ==================== Deletes ====================

    /// Delete rows by primary key. Only for single-key models.
    pub async fn delete<E, I, V>(&self, ctx: &ExecContext<'_, E>, ids: I) -> OrmResult<u64>
    where
        E: Executor,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let key = self.single_primary("delete")?.name.as_str();
        let query = match ids.len() {
            1 => Query::new().eq(key, ids.remove(0)),
            _ => Query::new().in_list(key, ids),
        };
        self.delete_range(ctx, &query).await
    }

    /// Delete rows matching `query`. A query without conditions is rejected.
    pub async fn delete_range<E: Executor>(&self, ctx: &ExecContext<'_, E>, query: &Query) -> OrmResult<u64> {
        let stmt = qb::delete_by(&self.registry, query)?;
        Ok(self.exec(ctx, "delete", &stmt.sql, &stmt.args).await?.affected)
    }

    /// Delete every row of the table.
    pub async fn delete_all<E: Executor>(&self, ctx: &ExecContext<'_, E>) -> OrmResult<u64> {
        let stmt = qb::delete_all(&self.registry);
        Ok(self.exec(ctx, "delete", &stmt.sql, &stmt.args).await?.affected)
    }
}
