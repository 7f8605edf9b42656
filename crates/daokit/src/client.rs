//! Execution collaborator trait.
//!
//! The compilers never touch a connection. Everything that runs SQL goes through an
//! [`Executor`]: it prepares a statement text against either a plain connection or
//! an open transaction handle, binds positional [`Value`] arguments and reports
//! rows or an affected count.

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;
use std::future::Future;

/// Outcome of a data-modifying statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub affected: u64,
    /// Generated identifier of the last inserted row, when the driver reports one.
    pub last_insert_id: Option<u64>,
}

/// A database connection (or pool) able to run statements and open transactions.
///
/// Every statement method takes an optional transaction handle; `None` runs the
/// statement on a plain connection.
pub trait Executor: Send + Sync {
    /// Transaction handle produced by [`begin`](Self::begin).
    type Txn: Send + Sync;

    fn begin(&self) -> impl Future<Output = OrmResult<Self::Txn>> + Send;

    fn commit(&self, txn: Self::Txn) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(&self, txn: Self::Txn) -> impl Future<Output = OrmResult<()>> + Send;

    /// Run a statement and return all rows.
    fn query(
        &self,
        txn: Option<&Self::Txn>,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Run a statement and return the affected count.
    fn execute(
        &self,
        txn: Option<&Self::Txn>,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send;
}
