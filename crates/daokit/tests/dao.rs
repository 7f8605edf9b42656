//! Dao operations against the recording executor.

mod common;

use common::{Call, RecordingExecutor};
use daokit::{
    Dao, DaoConfig, ExecContext, ExecResult, FromValue, InsertOptions, Model, Number, OrmError, OrmResult,
    Query, SelectOptions, ToValue, UpdateEntry, Value,
};
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Model)]
struct UserInfo {
    #[orm(primary, auto_increment)]
    id: i64,
    name: String,
    password: Option<String>,
    last_login: i64,
    avg_online_time: f32,
    #[orm(column = "b")]
    birth: i64,
    #[orm(omit)]
    scratch: Vec<String>,
}

/// Rejects negative amounts when flattened.
#[derive(Debug, Default, Clone, PartialEq)]
struct Checked(i64);

impl ToValue for Checked {
    fn to_value(&self) -> OrmResult<Value> {
        if self.0 < 0 {
            return Err(OrmError::validation("negative amount"));
        }
        Ok(Value::Int(self.0))
    }
}

impl FromValue for Checked {
    fn from_value(value: Value) -> OrmResult<Self> {
        i64::from_value(value).map(Checked)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Model)]
#[orm(table = "ledger")]
struct LedgerEntry {
    #[orm(id)]
    id: i64,
    amount: Checked,
}

#[derive(Debug, Default, Clone, PartialEq, Model)]
struct Membership {
    #[orm(primary)]
    group_id: i64,
    #[orm(primary)]
    user_id: i64,
    role: String,
}

const ALL_COLUMNS: &str = "`id`, `name`, `password`, `last_login`, `avg_online_time`, `b`";

fn users() -> Dao<UserInfo> {
    Dao::new(DaoConfig::new()).unwrap()
}

fn user_row(id: i64, name: &str) -> Vec<Value> {
    vec![
        Value::Int(id),
        Value::Bytes(name.as_bytes().to_vec()),
        Value::Null,
        Value::Int(100),
        Value::Float(1.5),
        Value::Int(19900101),
    ]
}

fn alice() -> UserInfo {
    UserInfo {
        id: 7,
        name: "alice".into(),
        password: Some("secret".into()),
        last_login: 100,
        avg_online_time: 2.5,
        birth: 19900101,
        scratch: vec!["ignored".into()],
    }
}

#[tokio::test]
async fn select_applies_default_limit() {
    let exec = RecordingExecutor::new();
    exec.push_rows(vec![user_row(1, "alice")]);
    let ctx = ExecContext::new(&exec);

    let rows = users()
        .select(&ctx, &Query::new().eq("name", "alice"), &SelectOptions::new())
        .await
        .unwrap();

    assert_eq!(
        exec.sql(),
        vec![format!("select {ALL_COLUMNS} from `user_info` where `name` = ? limit 0, 20")]
    );
    assert_eq!(exec.last_args(), vec![Value::Text("alice".into())]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "alice");
    assert_eq!(rows[0].password, None);
    assert_eq!(rows[0].avg_online_time, 1.5);
    assert!(rows[0].scratch.is_empty());
}

#[tokio::test]
async fn select_respects_explicit_limits() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = users();

    dao.select(&ctx, &Query::new().no_limit(), &SelectOptions::new())
        .await
        .unwrap();
    dao.select(&ctx, &Query::new().page(3, 10), &SelectOptions::new())
        .await
        .unwrap();
    let unbounded = Dao::<UserInfo>::new(DaoConfig::new().default_limit(None)).unwrap();
    unbounded
        .select(&ctx, &Query::new(), &SelectOptions::new())
        .await
        .unwrap();

    assert_eq!(
        exec.sql(),
        vec![
            format!("select {ALL_COLUMNS} from `user_info`"),
            format!("select {ALL_COLUMNS} from `user_info` limit 20, 10"),
            format!("select {ALL_COLUMNS} from `user_info`"),
        ]
    );
}

#[tokio::test]
async fn select_skips_rows_that_fail_to_materialize() {
    let exec = RecordingExecutor::new();
    let mut broken = user_row(2, "bob");
    broken[0] = Value::Text("not a number".into());
    exec.push_rows(vec![user_row(1, "alice"), broken, vec![Value::Int(3)]]);
    let ctx = ExecContext::new(&exec);

    let rows = users()
        .select(&ctx, &Query::new(), &SelectOptions::new())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 1);
}

#[tokio::test]
async fn select_projection_fills_named_fields() {
    let exec = RecordingExecutor::new();
    exec.push_rows(vec![vec![Value::Int(4), Value::Text("ALICE".into())]]);
    let ctx = ExecContext::new(&exec);

    let opts = SelectOptions::new().field_list("id, upper(@name@) as name");
    let rows = users().select(&ctx, &Query::new().limit(1), &opts).await.unwrap();

    assert_eq!(
        exec.sql(),
        vec!["select `id` as `id`, upper(`name`) as `name` from `user_info` limit 0, 1"]
    );
    assert_eq!(rows[0].id, 4);
    assert_eq!(rows[0].name, "ALICE");
    assert_eq!(rows[0].last_login, 0);
}

#[tokio::test]
async fn select_one_by_primary_key() {
    let exec = RecordingExecutor::new();
    exec.push_rows(vec![user_row(9, "zed")]);
    let ctx = ExecContext::new(&exec);
    let dao = users();

    let found = dao.select_one(&ctx, 9).await.unwrap();
    assert_eq!(found.map(|u| u.name), Some("zed".to_string()));

    let missing = dao.select_one(&ctx, 10).await.unwrap();
    assert!(missing.is_none());

    assert_eq!(
        exec.sql()[0],
        format!("select {ALL_COLUMNS} from `user_info` where `id` = ? limit 0, 1")
    );
}

#[tokio::test]
async fn select_one_by_query_forces_single_row() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);

    users()
        .select_one_by_query(&ctx, &Query::new().gt("b", 1).desc("id").limit(50), &SelectOptions::new())
        .await
        .unwrap();
    users().select_one_by(&ctx, "b", 5).await.unwrap();
    users().select_by(&ctx, "name", "x", 0).await.unwrap();

    assert_eq!(
        exec.sql(),
        vec![
            format!("select {ALL_COLUMNS} from `user_info` where `b` > ? order by `id` desc limit 0, 1"),
            format!("select {ALL_COLUMNS} from `user_info` where `b` = ? limit 0, 1"),
            format!("select {ALL_COLUMNS} from `user_info` where `name` = ? limit 0, 20"),
        ]
    );
}

#[tokio::test]
async fn select_one_requires_single_key() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = Dao::<Membership>::new(DaoConfig::new()).unwrap();

    let err = dao.select_one(&ctx, 1).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    let err = dao.delete(&ctx, [1, 2]).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert!(exec.calls().is_empty());
}

#[tokio::test]
async fn aggregates_compile_only_the_predicate() {
    let exec = RecordingExecutor::new();
    exec.push_rows(vec![vec![Value::Int(3)]]);
    exec.push_rows(vec![]);
    let ctx = ExecContext::new(&exec);
    let dao = users();

    let q = Query::new().gt("last_login", 10).desc("id").page(2, 5);
    assert_eq!(dao.count(&ctx, &q).await.unwrap(), 3);
    assert_eq!(dao.count_by(&ctx, "name", "nobody").await.unwrap(), 0);

    assert_eq!(
        exec.sql(),
        vec![
            "select count(*) from `user_info` where `last_login` > ?",
            "select count(*) from `user_info` where `name` = ?",
        ]
    );
}

#[tokio::test]
async fn sum_is_typed_by_field() {
    let exec = RecordingExecutor::new();
    // DECIMAL comes back as text
    exec.push_rows(vec![vec![Value::Bytes(b"42".to_vec())]]);
    exec.push_rows(vec![vec![Value::Float(7.25)]]);
    exec.push_rows(vec![vec![Value::Null]]);
    let ctx = ExecContext::new(&exec);
    let dao = users();

    let total = dao.sum(&ctx, "last_login", &Query::new()).await.unwrap();
    assert_eq!(total, Number::Int(42));
    let total = dao.sum(&ctx, "avg_online_time", &Query::new()).await.unwrap();
    assert_eq!(total, Number::Float(7.25));
    let total = dao.sum(&ctx, "b", &Query::new().eq("id", -1)).await.unwrap();
    assert_eq!(total.as_i64(), 0);

    let err = dao.sum(&ctx, "name", &Query::new()).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    let err = dao.sum(&ctx, "ghost", &Query::new()).await.unwrap_err();
    assert!(matches!(err, OrmError::UnknownField { .. }));

    assert_eq!(
        exec.sql(),
        vec![
            "select sum(`last_login`) from `user_info`",
            "select sum(`avg_online_time`) from `user_info`",
            "select sum(`b`) from `user_info` where `id` = ?",
        ]
    );
}

#[tokio::test]
async fn avg_of_empty_match_is_zero() {
    let exec = RecordingExecutor::new();
    exec.push_rows(vec![vec![Value::Null]]);
    exec.push_rows(vec![vec![Value::Text("12.5000".into())]]);
    let ctx = ExecContext::new(&exec);
    let dao = users();

    assert_eq!(dao.avg(&ctx, "last_login", &Query::new()).await.unwrap(), 0.0);
    assert_eq!(dao.avg(&ctx, "last_login", &Query::new()).await.unwrap(), 12.5);
    assert_eq!(exec.sql()[0], "select avg(`last_login`) from `user_info`");
}

#[tokio::test]
async fn insert_binds_every_mapped_field() {
    let exec = RecordingExecutor::new();
    exec.push_result(Ok(ExecResult {
        affected: 1,
        last_insert_id: Some(77),
    }));
    let ctx = ExecContext::new(&exec);

    let (affected, id) = users()
        .insert(&ctx, &alice(), InsertOptions::new())
        .await
        .unwrap();
    assert_eq!((affected, id), (1, Some(77)));
    assert_eq!(
        exec.sql(),
        vec![format!("insert into `user_info` ({ALL_COLUMNS}) values (?, ?, ?, ?, ?, ?)")]
    );
    assert_eq!(
        exec.last_args(),
        vec![
            Value::Int(7),
            Value::Text("alice".into()),
            Value::Text("secret".into()),
            Value::Int(100),
            Value::Float(2.5),
            Value::Int(19900101),
        ]
    );
}

#[tokio::test]
async fn insert_flavours() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = users();

    dao.insert(&ctx, &alice(), InsertOptions::new().ignore()).await.unwrap();
    dao.insert(&ctx, &alice(), InsertOptions::new().replace()).await.unwrap();

    let sql = exec.sql();
    assert!(sql[0].starts_with("insert ignore into `user_info` ("));
    assert!(sql[1].starts_with("replace into `user_info` ("));
}

#[tokio::test]
async fn batch_insert_opens_and_commits_its_own_transaction() {
    let exec = RecordingExecutor::new();
    exec.push_result(Ok(ExecResult {
        affected: 1,
        last_insert_id: Some(10),
    }));
    exec.push_result(Err(OrmError::driver("duplicate entry")));
    exec.push_result(Ok(ExecResult {
        affected: 1,
        last_insert_id: Some(12),
    }));
    let ctx = ExecContext::new(&exec);

    let rows = vec![alice(), alice(), alice()];
    let out = users()
        .batch_insert(&ctx, &rows, InsertOptions::new())
        .await
        .unwrap();

    assert_eq!(out.affected, 2);
    assert_eq!(out.ids, vec![Some(10), None, Some(12)]);

    let calls = exec.calls();
    assert_eq!(calls.first(), Some(&Call::Begin(1)));
    assert_eq!(calls.last(), Some(&Call::Commit(1)));
    let in_txn = calls
        .iter()
        .filter(|c| matches!(c, Call::Execute { txn: Some(1), .. }))
        .count();
    assert_eq!(in_txn, 3);
}

#[tokio::test]
async fn batch_insert_skips_rows_that_fail_to_flatten() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = Dao::<LedgerEntry>::new(DaoConfig::new()).unwrap();

    let rows = vec![
        LedgerEntry {
            id: 1,
            amount: Checked(5),
        },
        LedgerEntry {
            id: 2,
            amount: Checked(-1),
        },
    ];
    let out = dao.batch_insert(&ctx, &rows, InsertOptions::new()).await.unwrap();
    assert_eq!(out.affected, 1);
    assert_eq!(out.ids.len(), 2);
    assert_eq!(exec.sql().len(), 1);

    let none = dao.batch_insert(&ctx, &[], InsertOptions::new()).await.unwrap();
    assert_eq!(none.affected, 0);
    assert_eq!(exec.sql().len(), 1);
}

#[tokio::test]
async fn insert_many_uses_one_statement() {
    let exec = RecordingExecutor::new();
    exec.push_result(Ok(ExecResult {
        affected: 2,
        last_insert_id: Some(1),
    }));
    let ctx = ExecContext::new(&exec);
    let dao = Dao::<LedgerEntry>::new(DaoConfig::new()).unwrap();

    let rows = vec![
        LedgerEntry {
            id: 1,
            amount: Checked(5),
        },
        LedgerEntry {
            id: 2,
            amount: Checked(-5),
        },
        LedgerEntry {
            id: 3,
            amount: Checked(6),
        },
    ];
    let res = dao.insert_many(&ctx, &rows, InsertOptions::new()).await.unwrap();
    assert_eq!(res.affected, 2);
    assert_eq!(
        exec.sql(),
        vec!["insert into `ledger` (`id`, `amount`) values (?, ?), (?, ?)"]
    );
    assert_eq!(
        exec.last_args(),
        vec![Value::Int(1), Value::Int(5), Value::Int(3), Value::Int(6)]
    );

    let bad = vec![LedgerEntry {
        id: 4,
        amount: Checked(-1),
    }];
    let res = dao.insert_many(&ctx, &bad, InsertOptions::new()).await.unwrap();
    assert_eq!(res, ExecResult::default());
    assert_eq!(exec.sql().len(), 1);
}

#[tokio::test]
async fn update_binds_key_last() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);

    let affected = users().update(&ctx, &alice()).await.unwrap();
    assert_eq!(affected, 1);
    assert_eq!(
        exec.sql(),
        vec![
            "update `user_info` set `name` = ?, `password` = ?, `last_login` = ?, \
             `avg_online_time` = ?, `b` = ? where `id` = ?"
        ]
    );
    assert_eq!(exec.last_args().last(), Some(&Value::Int(7)));
    assert_eq!(exec.last_args().first(), Some(&Value::Text("alice".into())));
}

#[tokio::test]
async fn batch_update_recovers_per_row() {
    let exec = RecordingExecutor::new();
    exec.push_result(Ok(ExecResult {
        affected: 1,
        last_insert_id: None,
    }));
    exec.push_result(Err(OrmError::driver("lock wait timeout")));
    let ctx = ExecContext::new(&exec);
    let dao = Dao::<LedgerEntry>::new(DaoConfig::new()).unwrap();

    let rows = vec![
        LedgerEntry {
            id: 1,
            amount: Checked(1),
        },
        LedgerEntry {
            id: 2,
            amount: Checked(-2),
        },
        LedgerEntry {
            id: 3,
            amount: Checked(3),
        },
    ];
    let affected = dao.batch_update(&ctx, &rows).await.unwrap();
    assert_eq!(affected, 1);
    assert_eq!(
        exec.calls(),
        vec![
            Call::Begin(1),
            Call::Execute {
                txn: Some(1),
                sql: "update `ledger` set `amount` = ? where `id` = ?".into(),
                args: vec![Value::Int(1), Value::Int(1)],
            },
            Call::Execute {
                txn: Some(1),
                sql: "update `ledger` set `amount` = ? where `id` = ?".into(),
                args: vec![Value::Int(3), Value::Int(3)],
            },
            Call::Commit(1),
        ]
    );
}

#[tokio::test]
async fn update_by_requires_a_condition() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = users();

    let err = dao
        .update_by(&ctx, &Query::new(), &[UpdateEntry::value("name", "x")])
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::UnconditionalMutation("update")));
    assert!(exec.calls().is_empty());

    dao.update_by(
        &ctx,
        &Query::new().in_list("id", [1, 2]),
        &[UpdateEntry::increase("last_login", 1), UpdateEntry::value("b", 3)],
    )
    .await
    .unwrap();
    dao.update_all(&ctx, &[UpdateEntry::value("password", Value::Null)])
        .await
        .unwrap();

    assert_eq!(
        exec.sql(),
        vec![
            "update `user_info` set `last_login` = `last_login` + 1, `b` = ? where `id` in (?, ?)",
            "update `user_info` set `password` = ?",
        ]
    );
}

#[tokio::test]
async fn delete_by_ids() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = users();

    assert_eq!(dao.delete(&ctx, Vec::<i64>::new()).await.unwrap(), 0);
    assert!(exec.calls().is_empty());

    dao.delete(&ctx, [5]).await.unwrap();
    dao.delete(&ctx, [1, 2, 34]).await.unwrap();

    assert_eq!(
        exec.sql(),
        vec![
            "delete from `user_info` where `id` = ?",
            "delete from `user_info` where `id` in (?, ?, ?)",
        ]
    );
    assert_eq!(
        exec.last_args(),
        vec![Value::Int(1), Value::Int(2), Value::Int(34)]
    );
}

#[tokio::test]
async fn unconditional_delete_never_executes() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = users();

    let err = dao.delete_range(&ctx, &Query::new()).await.unwrap_err();
    assert!(matches!(err, OrmError::UnconditionalMutation("delete")));
    let err = dao
        .delete_range(&ctx, &Query::new().wrap(Query::new().or()))
        .await
        .unwrap_err();
    assert!(err.is_programming_error());
    assert!(exec.calls().is_empty());

    dao.delete_all(&ctx).await.unwrap();
    assert_eq!(exec.sql(), vec!["delete from `user_info`"]);
}

#[tokio::test]
async fn table_override_from_config() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = Dao::<UserInfo>::new(DaoConfig::new().table("users_archive")).unwrap();

    dao.delete(&ctx, [1]).await.unwrap();
    assert_eq!(exec.sql(), vec!["delete from `users_archive` where `id` = ?"]);
    assert_eq!(dao.registry().table(), "users_archive");
}

#[tokio::test]
async fn transaction_macro_commits_on_success() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = users();

    let out = daokit::transaction!(ctx, tx, {
        let n = dao.delete(&tx, [1]).await?;
        let batch = dao.batch_insert(&tx, &[alice()], InsertOptions::new()).await?;
        Ok::<_, OrmError>(n + batch.affected)
    })
    .unwrap();
    assert_eq!(out, 2);

    let calls = exec.calls();
    assert_eq!(calls.first(), Some(&Call::Begin(1)));
    assert_eq!(calls.last(), Some(&Call::Commit(1)));
    // the batch reused the ambient transaction
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::Begin(_))).count(), 1);
    assert!(
        calls
            .iter()
            .all(|c| !matches!(c, Call::Execute { txn: None, .. }))
    );
}

#[tokio::test]
async fn transaction_macro_rolls_back_on_error() {
    let exec = RecordingExecutor::new();
    let ctx = ExecContext::new(&exec);
    let dao = users();

    let res: OrmResult<u64> = daokit::transaction!(ctx, tx, {
        dao.delete(&tx, [1]).await?;
        dao.delete_range(&tx, &Query::new()).await
    });
    assert!(matches!(res, Err(OrmError::UnconditionalMutation(_))));
    assert_eq!(exec.calls().last(), Some(&Call::Rollback(1)));
}

#[tokio::test]
async fn query_timeout_from_config() {
    let exec = RecordingExecutor::with_delay(Duration::from_millis(200));
    let ctx = ExecContext::new(&exec);
    let dao = Dao::<UserInfo>::new(DaoConfig::new().query_timeout(Duration::from_millis(5))).unwrap();

    let err = dao.count(&ctx, &Query::new()).await.unwrap_err();
    assert!(err.is_timeout());

    // a context timeout takes precedence over the configured one
    let patient = ctx.with_timeout(Duration::from_secs(5));
    assert_eq!(dao.count(&patient, &Query::new()).await.unwrap(), 0);
}
