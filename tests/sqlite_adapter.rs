#![cfg(feature = "sqlite")]

mod common;

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use common::TestResult;
use queue_adapter::prelude::*;
use serde_json::json;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

async fn pool(prefix: &str) -> Result<SqliteConnPool, AdapterError> {
    common::init_tracing();
    SqliteOptionsBuilder::new(unique_db_path(prefix))
        .max_size(4)
        .build()
        .await
}

#[tokio::test]
async fn insert_reports_one_row() -> TestResult {
    common::insert_reports_one_row(&pool("insert").await?, "t").await
}

#[tokio::test]
async fn missing_row_is_no_rows() -> TestResult {
    common::missing_row_is_no_rows(&pool("missing").await?, "t").await
}

#[tokio::test]
async fn rows_affected_is_exact() -> TestResult {
    common::rows_affected_is_exact(&pool("affected").await?, "t").await
}

#[tokio::test]
async fn execute_consumes_returning_rows() -> TestResult {
    common::execute_consumes_returning_rows(&pool("returning").await?, "t").await
}

#[tokio::test]
async fn schema_changes_report_zero() -> TestResult {
    common::schema_changes_report_zero(&pool("schema").await?, "t").await
}

#[tokio::test]
async fn first_row_wins() -> TestResult {
    common::first_row_wins(&pool("first").await?, "t").await
}

#[tokio::test]
async fn placeholders_keep_their_numbers() -> TestResult {
    common::placeholders_keep_their_numbers(&pool("placeholders").await?, "t").await
}

#[tokio::test]
async fn finished_tx_is_closed() -> TestResult {
    common::finished_tx_is_closed(&pool("closed_tx").await?, "t").await
}

#[tokio::test]
async fn finished_leased_tx_is_closed() -> TestResult {
    common::finished_leased_tx_is_closed(&pool("closed_leased_tx").await?, "t").await
}

#[tokio::test]
async fn rollback_discards_writes() -> TestResult {
    common::rollback_discards_writes(&pool("rollback").await?, "t").await
}

#[tokio::test]
async fn leased_connection_round_trip() -> TestResult {
    common::leased_connection_round_trip(&pool("leased").await?, "t").await
}

#[tokio::test]
async fn dropped_leased_tx_rolls_back() -> TestResult {
    common::dropped_leased_tx_rolls_back(&pool("dropped_leased").await?, "t").await
}

#[tokio::test]
async fn scan_count_must_match() -> TestResult {
    common::scan_count_must_match(&pool("scan_count").await?, "t").await
}

#[tokio::test]
async fn closed_pool_refuses_work() -> TestResult {
    common::closed_pool_refuses_work(&pool("closed_pool").await?).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropped_pool_tx_rolls_back_before_reuse() -> TestResult {
    // a single connection forces the next call to wait for the rollback
    let pool = SqliteOptionsBuilder::new(unique_db_path("dropped_pool_tx"))
        .max_size(1)
        .build()
        .await?;
    common::reset_table(&pool, "t").await?;

    let mut tx = pool.begin().await?;
    tx.execute("INSERT INTO t (id, a) VALUES ($1, $2)", &[RowValues::Int(1), RowValues::Int(1)])
        .await?;
    drop(tx);

    let mut tx = pool.begin().await?;
    tx.execute("INSERT INTO t (id, a) VALUES ($1, $2)", &[RowValues::Int(2), RowValues::Int(2)])
        .await?;
    tx.commit().await?;
    drop(tx);

    let mut id = 0_i64;
    pool.query_row("SELECT id FROM t", &[])
        .scan(&mut [&mut id])
        .await?;
    assert_eq!(id, 2);
    assert_eq!(common::count_rows(&pool, "t").await?, 1);
    Ok(())
}

#[tokio::test]
async fn native_errors_pass_through() -> TestResult {
    let pool = pool("native_errors").await?;
    common::reset_table(&pool, "t").await?;
    let insert = "INSERT INTO t (id, a) VALUES ($1, $2)";
    pool.execute(insert, &[RowValues::Int(1), RowValues::Int(1)]).await?;

    let err = pool
        .execute(insert, &[RowValues::Int(1), RowValues::Int(2)])
        .await
        .unwrap_err();
    assert!(
        matches!(
            &err,
            AdapterError::SqliteError(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        ),
        "got {err:?}"
    );
    assert!(!err.is_no_rows() && !err.is_tx_closed());
    Ok(())
}

#[tokio::test]
async fn argument_count_is_checked() -> TestResult {
    let pool = pool("arg_count").await?;
    common::reset_table(&pool, "t").await?;
    let err = pool
        .execute("INSERT INTO t (id, a) VALUES ($1, $2)", &[RowValues::Int(1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdapterError::SqliteError(rusqlite::Error::InvalidParameterCount(1, 2))
    ));
    Ok(())
}

#[tokio::test]
async fn typed_values_round_trip_through_text_storage() -> TestResult {
    let pool = pool("typed").await?;
    pool.execute(
        "CREATE TABLE jobs (run_at TIMESTAMP, args TEXT, finalized BOOLEAN, payload BLOB, score REAL)",
        &[],
    )
    .await?;

    let run_at = NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_micro_opt(5, 6, 7, 890)
        .unwrap();
    pool.execute(
        "INSERT INTO jobs VALUES ($1, $2, $3, $4, $5)",
        &[
            RowValues::Timestamp(run_at),
            RowValues::JSON(json!({"to": "ops@example.com"})),
            RowValues::Bool(true),
            RowValues::Blob(vec![0, 1, 2]),
            RowValues::Float(0.5),
        ],
    )
    .await?;

    let mut got_run_at = NaiveDateTime::default();
    let mut args = serde_json::Value::Null;
    let mut finalized = false;
    let mut payload = Vec::new();
    let mut score = 0.0_f64;
    pool.query_row("SELECT run_at, args, finalized, payload, score FROM jobs", &[])
        .scan(&mut [
            &mut got_run_at,
            &mut args,
            &mut finalized,
            &mut payload,
            &mut score,
        ])
        .await?;

    assert_eq!(got_run_at, run_at);
    assert_eq!(args, json!({"to": "ops@example.com"}));
    assert!(finalized);
    assert_eq!(payload, vec![0, 1, 2]);
    assert!((score - 0.5).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_leases_share_the_pool() -> TestResult {
    let pool = pool("concurrent").await?;
    common::reset_table(&pool, "t").await?;

    let mut handles = Vec::new();
    for id in 1..=8_i64 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut conn = pool.acquire().await?;
            let mut tx = conn.begin().await?;
            tx.execute("INSERT INTO t (id, a) VALUES ($1, $2)", &[RowValues::Int(id), RowValues::Int(id)])
                .await?;
            tx.commit().await?;
            drop(tx);
            conn.release().await?;
            Ok::<(), AdapterError>(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(common::count_rows(&pool, "t").await?, 8);
    Ok(())
}

#[tokio::test]
async fn acquire_waits_only_on_pool_size() -> TestResult {
    let pool = SqliteOptionsBuilder::new(unique_db_path("pool_size"))
        .max_size(2)
        .wait_timeout(Duration::from_millis(50))
        .build()
        .await?;

    let first = pool.acquire().await?;
    let second = pool.acquire().await?;
    let err = pool.acquire().await.err().expect("third lease should time out");
    assert!(matches!(err, AdapterError::PoolErrorSqlite(_)), "got {err:?}");

    first.release().await?;
    let third = pool.acquire().await?;
    third.release().await?;
    second.release().await?;
    Ok(())
}

#[tokio::test]
async fn open_pool_by_backend_kind() -> TestResult {
    let pool = open_pool(BackendKind::Sqlite, &unique_db_path("by_kind")).await?;
    assert_eq!(pool.backend(), BackendKind::Sqlite);
    pool.ping().await?;
    Ok(())
}
