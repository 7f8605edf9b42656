//! Call context: executor, optional ambient transaction and timeout.
//!
//! Every [`Dao`](crate::Dao) operation takes an explicit `&ExecContext`. Statements
//! run inside the transaction carried by the context, if any; batch writes that
//! find none open (and commit) their own.
//!
//! For commit/rollback handling, use the [`transaction!`](crate::transaction) macro.
//!
//! # Example
//!
//! ```ignore
//! use daokit::{ExecContext, OrmError};
//!
//! let ctx = ExecContext::new(&executor);
//! let moved = daokit::transaction!(ctx, tx, {
//!     let n = accounts.update_by(&tx, &from, &[debit]).await?;
//!     accounts.update_by(&tx, &to, &[credit]).await?;
//!     Ok::<_, OrmError>(n)
//! })?;
//! ```

use crate::client::{ExecResult, Executor};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use std::future::Future;
use std::time::Duration;

/// Runs the given block inside a transaction opened on the context's executor.
///
/// - Begins a transaction via `Executor::begin`.
/// - Binds `$tx` to a context carrying it (and the outer context's timeout).
/// - Commits on `Ok(_)`, rolls back on `Err(_)`.
///
/// The block must evaluate to `daokit::OrmResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($ctx:expr, $tx:ident, $body:block) => {{
        let __daokit_ctx = &$ctx;
        let __daokit_exec = __daokit_ctx.executor();
        match $crate::Executor::begin(__daokit_exec).await {
            Err(error) => Err(error),
            Ok(__daokit_txn) => {
                let __daokit_body_result = {
                    let $tx = __daokit_ctx.with_txn(&__daokit_txn);
                    async { $body }.await
                };
                match __daokit_body_result {
                    Ok(value) => $crate::Executor::commit(__daokit_exec, __daokit_txn)
                        .await
                        .map(|()| value),
                    Err(error) => match $crate::Executor::rollback(__daokit_exec, __daokit_txn).await {
                        Ok(()) => Err(error),
                        Err(rollback_err) => Err($crate::OrmError::Other(format!(
                            "{error} (rollback failed: {rollback_err})"
                        ))),
                    },
                }
            }
        }
    }};
}

/// Explicit execution scope threaded through every call.
pub struct ExecContext<'a, E: Executor> {
    executor: &'a E,
    txn: Option<&'a E::Txn>,
    timeout: Option<Duration>,
}

impl<E: Executor> Clone for ExecContext<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Executor> Copy for ExecContext<'_, E> {}

impl<'a, E: Executor> ExecContext<'a, E> {
    /// Context without a transaction or timeout.
    pub fn new(executor: &'a E) -> Self {
        Self {
            executor,
            txn: None,
            timeout: None,
        }
    }

    /// Same context, running inside `txn`.
    pub fn with_txn<'b>(&self, txn: &'b E::Txn) -> ExecContext<'b, E>
    where
        'a: 'b,
    {
        ExecContext {
            executor: self.executor,
            txn: Some(txn),
            timeout: self.timeout,
        }
    }

    /// Bound every executor call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn or_timeout(self, timeout: Option<Duration>) -> Self {
        Self {
            timeout: self.timeout.or(timeout),
            ..self
        }
    }

    pub fn executor(&self) -> &'a E {
        self.executor
    }

    pub fn txn(&self) -> Option<&'a E::Txn> {
        self.txn
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn bounded<T>(&self, fut: impl Future<Output = OrmResult<T>>) -> OrmResult<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| OrmError::Timeout(limit))?,
            None => fut.await,
        }
    }

    pub async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.bounded(self.executor.query(self.txn, sql, args)).await
    }

    pub async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.bounded(self.executor.execute(self.txn, sql, args)).await
    }

    pub(crate) async fn begin(&self) -> OrmResult<E::Txn> {
        self.bounded(self.executor.begin()).await
    }

    pub(crate) async fn commit(&self, txn: E::Txn) -> OrmResult<()> {
        self.bounded(self.executor.commit(txn)).await
    }
}
