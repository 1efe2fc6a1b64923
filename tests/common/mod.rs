#![allow(dead_code)]

//! Scenarios every backend must pass, run against a `&dyn ConnPool`.

use queue_adapter::prelude::*;
use tracing_subscriber::EnvFilter;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Route adapter events to the test output; `RUST_LOG=queue_adapter=debug` shows them.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub async fn reset_table(pool: &dyn ConnPool, table: &str) -> Result<(), AdapterError> {
    pool.execute(&format!("DROP TABLE IF EXISTS {table}"), &[])
        .await?;
    pool.execute(
        &format!("CREATE TABLE {table} (id BIGINT PRIMARY KEY, a BIGINT, note TEXT)"),
        &[],
    )
    .await?;
    Ok(())
}

pub async fn count_rows(pool: &dyn ConnPool, table: &str) -> Result<i64, AdapterError> {
    let mut count = 0_i64;
    pool.query_row(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .scan(&mut [&mut count])
        .await?;
    Ok(count)
}

pub async fn insert_reports_one_row(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    let tag = pool
        .execute(
            &format!("INSERT INTO {table} (id, a) VALUES ($1, $2)"),
            &[RowValues::Int(1), RowValues::Int(5)],
        )
        .await?;
    assert_eq!(tag.rows_affected(), 1);

    let mut a = 0_i64;
    pool.query_row(&format!("SELECT a FROM {table} WHERE id = $1"), &[RowValues::Int(1)])
        .scan(&mut [&mut a])
        .await?;
    assert_eq!(a, 5);
    Ok(())
}

pub async fn missing_row_is_no_rows(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    let mut a = 0_i64;
    let err = pool
        .query_row(&format!("SELECT a FROM {table} WHERE a = $1"), &[RowValues::Int(999)])
        .scan(&mut [&mut a])
        .await
        .unwrap_err();
    assert!(err.is_no_rows(), "expected NoRows, got {err:?}");
    Ok(())
}

pub async fn rows_affected_is_exact(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    for id in 1..=3 {
        pool.execute(
            &format!("INSERT INTO {table} (id, a) VALUES ($1, 0)"),
            &[RowValues::Int(id)],
        )
        .await?;
    }

    let update_one = format!("UPDATE {table} SET a = a + 1 WHERE id = $1");
    assert_eq!(pool.execute(&update_one, &[RowValues::Int(999)]).await?.rows_affected(), 0);
    assert_eq!(pool.execute(&update_one, &[RowValues::Int(2)]).await?.rows_affected(), 1);

    let update_all = format!("UPDATE {table} SET a = a + 1");
    assert_eq!(pool.execute(&update_all, &[]).await?.rows_affected(), 3);
    Ok(())
}

pub async fn execute_consumes_returning_rows(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    let tag = pool
        .execute(
            &format!("INSERT INTO {table} (id, a) VALUES ($1, $2) RETURNING id"),
            &[RowValues::Int(1), RowValues::Int(5)],
        )
        .await?;
    assert_eq!(tag.rows_affected(), 1);
    assert_eq!(count_rows(pool, table).await?, 1);

    // a statement that only yields rows still succeeds through execute
    pool.execute(&format!("SELECT id FROM {table}"), &[]).await?;
    assert_eq!(count_rows(pool, table).await?, 1);
    Ok(())
}

pub async fn schema_changes_report_zero(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    let aux = format!("{table}_aux");
    let mut conn = pool.acquire().await?;
    conn.execute(&format!("DROP TABLE IF EXISTS {aux}"), &[]).await?;

    let tag = conn
        .execute(
            &format!("INSERT INTO {table} (id, a) VALUES (1, 0), (2, 0), (3, 0)"),
            &[],
        )
        .await?;
    assert_eq!(tag.rows_affected(), 3);

    let tag = conn
        .execute(&format!("CREATE TABLE {aux} (id BIGINT PRIMARY KEY)"), &[])
        .await?;
    assert_eq!(tag.rows_affected(), 0);
    let tag = conn.execute(&format!("DROP TABLE {aux}"), &[]).await?;
    assert_eq!(tag.rows_affected(), 0);

    conn.release().await?;
    Ok(())
}

pub async fn first_row_wins(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    for id in 1..=3 {
        pool.execute(
            &format!("INSERT INTO {table} (id, a) VALUES ($1, $1)"),
            &[RowValues::Int(id)],
        )
        .await?;
    }
    let mut id = 0_i64;
    pool.query_row(&format!("SELECT id FROM {table} ORDER BY id DESC"), &[])
        .scan(&mut [&mut id])
        .await?;
    assert_eq!(id, 3);
    Ok(())
}

pub async fn placeholders_keep_their_numbers(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    pool.execute(
        &format!("INSERT INTO {table} (note, id, a) VALUES ($3, $1, $2)"),
        &[
            RowValues::Int(10),
            RowValues::Int(20),
            RowValues::Text("it's $1 inside a literal".into()),
        ],
    )
    .await?;

    let mut note = String::new();
    let mut a = 0_i64;
    pool.query_row(
        &format!("SELECT note, a FROM {table} WHERE id = $1 AND note <> '$2'"),
        &[RowValues::Int(10)],
    )
    .scan(&mut [&mut note, &mut a])
    .await?;
    assert_eq!(note, "it's $1 inside a literal");
    assert_eq!(a, 20);
    Ok(())
}

pub async fn finished_tx_is_closed(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    let insert = format!("INSERT INTO {table} (id, a) VALUES ($1, $2)");

    let mut tx = pool.begin().await?;
    tx.execute(&insert, &[RowValues::Int(1), RowValues::Int(1)])
        .await?;
    tx.commit().await?;

    let err = tx
        .execute(&insert, &[RowValues::Int(2), RowValues::Int(2)])
        .await
        .unwrap_err();
    assert!(err.is_tx_closed(), "expected TxClosed, got {err:?}");
    assert!(tx.rollback().await.unwrap_err().is_tx_closed());
    assert!(tx.commit().await.unwrap_err().is_tx_closed());

    let mut a = 0_i64;
    let err = tx
        .query_row(&format!("SELECT a FROM {table}"), &[])
        .scan(&mut [&mut a])
        .await
        .unwrap_err();
    assert!(err.is_tx_closed());
    drop(tx);

    assert_eq!(count_rows(pool, table).await?, 1);
    Ok(())
}

pub async fn finished_leased_tx_is_closed(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    let insert = format!("INSERT INTO {table} (id, a) VALUES ($1, $2)");
    let mut conn = pool.acquire().await?;

    let mut tx = conn.begin().await?;
    tx.execute(&insert, &[RowValues::Int(1), RowValues::Int(1)])
        .await?;
    tx.commit().await?;

    assert!(tx.rollback().await.unwrap_err().is_tx_closed());
    let err = tx
        .execute(&insert, &[RowValues::Int(2), RowValues::Int(2)])
        .await
        .unwrap_err();
    assert!(err.is_tx_closed(), "expected TxClosed, got {err:?}");
    drop(tx);

    // the connection itself stays usable and the committed row is kept
    let mut count = 0_i64;
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .scan(&mut [&mut count])
        .await?;
    assert_eq!(count, 1);
    conn.release().await?;
    Ok(())
}

pub async fn rollback_discards_writes(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    let mut tx = pool.begin().await?;
    tx.execute(
        &format!("INSERT INTO {table} (id, a) VALUES ($1, $2)"),
        &[RowValues::Int(1), RowValues::Int(1)],
    )
    .await?;

    let mut seen = 0_i64;
    tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .scan(&mut [&mut seen])
        .await?;
    assert_eq!(seen, 1);

    tx.rollback().await?;
    drop(tx);
    assert_eq!(count_rows(pool, table).await?, 0);
    Ok(())
}

pub async fn leased_connection_round_trip(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    let mut conn = pool.acquire().await?;
    conn.ping().await?;

    let mut tx = conn.begin().await?;
    tx.execute(
        &format!("INSERT INTO {table} (id, a, note) VALUES ($1, $2, $3)"),
        &[RowValues::Int(1), RowValues::Int(7), RowValues::Null],
    )
    .await?;
    tx.commit().await?;
    drop(tx);

    let mut a = 0_i64;
    let mut note: Option<String> = Some("stale".into());
    conn.query_row(&format!("SELECT a, note FROM {table} WHERE id = $1"), &[RowValues::Int(1)])
        .scan(&mut [&mut a, &mut note])
        .await?;
    assert_eq!((a, note), (7, None));

    conn.release().await?;
    Ok(())
}

pub async fn dropped_leased_tx_rolls_back(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    let mut conn = pool.acquire().await?;

    let mut tx = conn.begin().await?;
    tx.execute(
        &format!("INSERT INTO {table} (id, a) VALUES ($1, $2)"),
        &[RowValues::Int(1), RowValues::Int(1)],
    )
    .await?;
    drop(tx);

    // the abandoned transaction is settled before this statement runs outside it
    conn.execute(
        &format!("INSERT INTO {table} (id, a) VALUES ($1, $2)"),
        &[RowValues::Int(2), RowValues::Int(2)],
    )
    .await?;

    let mut ids = 0_i64;
    conn.query_row(&format!("SELECT MAX(id) FROM {table}"), &[])
        .scan(&mut [&mut ids])
        .await?;
    assert_eq!(ids, 2);

    conn.release().await?;
    assert_eq!(count_rows(pool, table).await?, 1);
    Ok(())
}

pub async fn scan_count_must_match(pool: &dyn ConnPool, table: &str) -> TestResult {
    reset_table(pool, table).await?;
    pool.execute(
        &format!("INSERT INTO {table} (id, a) VALUES ($1, $2)"),
        &[RowValues::Int(1), RowValues::Int(1)],
    )
    .await?;
    let mut only = 0_i64;
    let err = pool
        .query_row(&format!("SELECT id, a FROM {table}"), &[])
        .scan(&mut [&mut only])
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::ScanError(_)));
    Ok(())
}

pub async fn closed_pool_refuses_work(pool: &dyn ConnPool) -> TestResult {
    pool.ping().await?;
    pool.close().await?;
    let err = pool.execute("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, AdapterError::PoolClosed), "got {err:?}");
    assert!(matches!(
        pool.acquire().await.err(),
        Some(AdapterError::PoolClosed)
    ));
    assert!(matches!(pool.begin().await.err(), Some(AdapterError::PoolClosed)));
    Ok(())
}
