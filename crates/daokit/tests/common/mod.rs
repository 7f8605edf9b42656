//! In-memory executor that records every call and replays programmed results.

#![allow(dead_code)]

use daokit::{ExecResult, Executor, OrmResult, Row, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Begin(u32),
    Commit(u32),
    Rollback(u32),
    Query {
        txn: Option<u32>,
        sql: String,
        args: Vec<Value>,
    },
    Execute {
        txn: Option<u32>,
        sql: String,
        args: Vec<Value>,
    },
}

#[derive(Debug)]
pub struct Txn(pub u32);

#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    results: Mutex<VecDeque<OrmResult<ExecResult>>>,
    next_txn: AtomicU32,
    delay: Option<Duration>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement sleeps `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Queue the rows returned by the next `query`.
    pub fn push_rows(&self, rows: Vec<Vec<Value>>) {
        let rows = rows.into_iter().map(Row::new).collect();
        self.rows.lock().unwrap().push_back(rows);
    }

    /// Queue the outcome of the next `execute`.
    pub fn push_result(&self, result: OrmResult<ExecResult>) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// SQL text of every query / execute, in order.
    pub fn sql(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Query { sql, .. } | Call::Execute { sql, .. } => Some(sql),
                _ => None,
            })
            .collect()
    }

    /// Arguments of the last query / execute.
    pub fn last_args(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                Call::Query { args, .. } | Call::Execute { args, .. } => Some(args),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Executor for RecordingExecutor {
    type Txn = Txn;

    async fn begin(&self) -> OrmResult<Txn> {
        let id = self.next_txn.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(Call::Begin(id));
        Ok(Txn(id))
    }

    async fn commit(&self, txn: Txn) -> OrmResult<()> {
        self.record(Call::Commit(txn.0));
        Ok(())
    }

    async fn rollback(&self, txn: Txn) -> OrmResult<()> {
        self.record(Call::Rollback(txn.0));
        Ok(())
    }

    async fn query(&self, txn: Option<&Txn>, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.pause().await;
        self.record(Call::Query {
            txn: txn.map(|t| t.0),
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, txn: Option<&Txn>, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.pause().await;
        self.record(Call::Execute {
            txn: txn.map(|t| t.0),
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        let next = self.results.lock().unwrap().pop_front();
        next.unwrap_or(Ok(ExecResult {
            affected: 1,
            last_insert_id: None,
        }))
    }
}
