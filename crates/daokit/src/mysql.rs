//! [`Executor`] backed by a `mysql_async` connection pool.
//!
//! Statements outside a transaction check a connection out of the pool for the
//! duration of the call; a transaction pins one connection until it is committed
//! or rolled back.
//!
//! ```ignore
//! let exec = daokit::mysql::MySqlExecutor::from_url("mysql://root@localhost/test")?;
//! let ctx = daokit::ExecContext::new(&exec);
//! ```

use crate::client::{ExecResult, Executor};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use mysql_async::prelude::Queryable;
use mysql_async::{Params, Pool, TxOpts};
use tokio::sync::Mutex;

/// Pool-backed executor.
#[derive(Debug, Clone)]
pub struct MySqlExecutor {
    pool: Pool,
}

/// Open transaction on one pooled connection.
pub struct MySqlTxn {
    inner: Mutex<mysql_async::Transaction<'static>>,
}

impl MySqlExecutor {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build a pool from a `mysql://` URL.
    pub fn from_url(url: &str) -> OrmResult<Self> {
        let opts = mysql_async::Opts::from_url(url).map_err(OrmError::driver)?;
        Ok(Self::new(Pool::new(opts)))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn disconnect(self) -> OrmResult<()> {
        self.pool.disconnect().await?;
        Ok(())
    }
}

impl From<Pool> for MySqlExecutor {
    fn from(pool: Pool) -> Self {
        Self::new(pool)
    }
}

impl Executor for MySqlExecutor {
    type Txn = MySqlTxn;

    async fn begin(&self) -> OrmResult<MySqlTxn> {
        let txn = self.pool.start_transaction(TxOpts::default()).await?;
        Ok(MySqlTxn {
            inner: Mutex::new(txn),
        })
    }

    async fn commit(&self, txn: MySqlTxn) -> OrmResult<()> {
        txn.inner.into_inner().commit().await?;
        Ok(())
    }

    async fn rollback(&self, txn: MySqlTxn) -> OrmResult<()> {
        txn.inner.into_inner().rollback().await?;
        Ok(())
    }

    async fn query(&self, txn: Option<&MySqlTxn>, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let params = to_params(args)?;
        let rows: Vec<mysql_async::Row> = match txn {
            Some(txn) => txn.inner.lock().await.exec(sql, params).await?,
            None => self.pool.get_conn().await?.exec(sql, params).await?,
        };
        Ok(rows
            .into_iter()
            .map(|row| Row::new(row.unwrap().into_iter().map(from_mysql).collect()))
            .collect())
    }

    async fn execute(&self, txn: Option<&MySqlTxn>, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let params = to_params(args)?;
        match txn {
            Some(txn) => {
                let mut guard = txn.inner.lock().await;
                guard.exec_drop(sql, params).await?;
                Ok(ExecResult {
                    affected: guard.affected_rows(),
                    last_insert_id: guard.last_insert_id().filter(|&id| id > 0),
                })
            }
            None => {
                let mut conn = self.pool.get_conn().await?;
                conn.exec_drop(sql, params).await?;
                Ok(ExecResult {
                    affected: conn.affected_rows(),
                    last_insert_id: conn.last_insert_id().filter(|&id| id > 0),
                })
            }
        }
    }
}

fn to_params(args: &[Value]) -> OrmResult<Params> {
    if args.is_empty() {
        return Ok(Params::Empty);
    }
    let values = args.iter().map(to_mysql).collect::<OrmResult<Vec<_>>>()?;
    Ok(Params::Positional(values))
}

// MySQL DATE / DATETIME carry the year as u16.
fn mysql_year(year: i32) -> OrmResult<u16> {
    u16::try_from(year).map_err(|_| OrmError::driver(format!("year {year} cannot be sent to MySQL")))
}

fn to_mysql(value: &Value) -> OrmResult<mysql_async::Value> {
    use mysql_async::Value as My;
    Ok(match value {
        Value::Null => My::NULL,
        Value::Bool(v) => My::Int(i64::from(*v)),
        Value::Int(v) => My::Int(*v),
        Value::UInt(v) => My::UInt(*v),
        Value::Float(v) => My::Double(*v),
        Value::Text(v) => My::Bytes(v.as_bytes().to_vec()),
        Value::Bytes(v) => My::Bytes(v.clone()),
        Value::Date(d) => My::Date(mysql_year(d.year())?, d.month() as u8, d.day() as u8, 0, 0, 0, 0),
        Value::DateTime(dt) => My::Date(
            mysql_year(dt.year())?,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.nanosecond() / 1_000,
        ),
        Value::Uuid(v) => My::Bytes(v.to_string().into_bytes()),
        Value::Json(v) => My::Bytes(v.to_string().into_bytes()),
    })
}

fn from_mysql(value: mysql_async::Value) -> Value {
    use mysql_async::Value as My;
    match value {
        My::NULL => Value::Null,
        My::Bytes(b) => Value::Bytes(b),
        My::Int(v) => Value::Int(v),
        My::UInt(v) => Value::UInt(v),
        My::Float(v) => Value::Float(f64::from(v)),
        My::Double(v) => Value::Float(v),
        My::Date(y, mo, d, h, mi, s, us) => {
            let time = NaiveTime::from_hms_micro_opt(h.into(), mi.into(), s.into(), us);
            match (NaiveDate::from_ymd_opt(y.into(), mo.into(), d.into()), time) {
                (Some(date), Some(time)) => Value::DateTime(date.and_time(time)),
                // zero dates such as 0000-00-00
                _ => Value::Text(format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")),
            }
        }
        My::Time(neg, days, h, mi, s, us) => {
            let hours = days * 24 + u32::from(h);
            let sign = if neg { "-" } else { "" };
            Value::Text(format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}"))
        }
    }
}
