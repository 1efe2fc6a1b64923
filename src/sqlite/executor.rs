use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::AdapterError;
use crate::results::CommandTag;
use crate::translation::{PlaceholderStyle, translate_placeholders};
use crate::types::{ParamConverter, RowValues};

use super::config::{SharedSqliteConnection, SqlitePooledConnection};
use super::params::Params;
use super::query::extract_row;

/// Run `func` against the connection on tokio's blocking pool.
pub(crate) async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, AdapterError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, AdapterError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| AdapterError::ConnectionError(format!("sqlite spawn_blocking join error: {e}")))?
}

/// A statement rewritten to `?N` placeholders, with its arguments converted.
pub(crate) struct Prepared {
    sql: String,
    params: Params,
}

impl Prepared {
    pub(crate) fn new(sql: &str, args: &[RowValues]) -> Result<Self, AdapterError> {
        Ok(Self {
            sql: translate_placeholders(sql, PlaceholderStyle::Sqlite).into_owned(),
            params: Params::convert_sql_params(args)?,
        })
    }
}

/// Step the statement to completion and report the rows it changed.
///
/// Result rows (`RETURNING`, plain `SELECT`) are drained and discarded. `changes()` keeps the
/// count of the last DML statement, so a statement that changed nothing reports 0 instead.
fn execute_sync(conn: &rusqlite::Connection, prepared: &Prepared) -> Result<CommandTag, AdapterError> {
    let before = conn.total_changes();
    let mut stmt = conn.prepare_cached(&prepared.sql)?;
    prepared.params.bind(&mut stmt)?;
    {
        let mut rows = stmt.raw_query();
        while rows.next()?.is_some() {}
    }
    let affected = if conn.total_changes() == before {
        0
    } else {
        conn.changes()
    };
    Ok(CommandTag::from(affected))
}

fn query_first_sync(
    conn: &rusqlite::Connection,
    prepared: &Prepared,
) -> Result<Vec<RowValues>, AdapterError> {
    let mut stmt = conn.prepare_cached(&prepared.sql)?;
    prepared.params.bind(&mut stmt)?;
    let column_count = stmt.column_count();
    // dropping `rows` resets the statement and discards any further rows
    let mut rows = stmt.raw_query();
    let row = rows.next()?.ok_or(AdapterError::NoRows)?;
    extract_row(row, column_count)
}

/// Execute a statement and report the rows it changed.
///
/// # Errors
/// Returns errors from preparation, binding or execution.
pub(crate) async fn execute_on(
    conn: SharedSqliteConnection,
    sql: &str,
    args: &[RowValues],
) -> Result<CommandTag, AdapterError> {
    let prepared = Prepared::new(sql, args)?;
    let tag = run_blocking(conn, move |c| execute_sync(c, &prepared)).await?;
    debug!(rows_affected = tag.rows_affected(), "sqlite execute");
    Ok(tag)
}

/// Run a query and extract its first row.
///
/// # Errors
/// Returns `AdapterError::NoRows` for an empty result, otherwise errors from preparation,
/// binding, execution or extraction.
pub(crate) async fn query_first(
    conn: SharedSqliteConnection,
    sql: &str,
    args: &[RowValues],
) -> Result<Vec<RowValues>, AdapterError> {
    let prepared = Prepared::new(sql, args)?;
    run_blocking(conn, move |c| query_first_sync(c, &prepared)).await
}

/// Run a transaction-control statement such as `BEGIN`, `COMMIT` or `ROLLBACK`.
pub(crate) async fn control(conn: SharedSqliteConnection, sql: &'static str) -> Result<(), AdapterError> {
    run_blocking(conn, move |c| {
        c.execute_batch(sql)?;
        Ok(())
    })
    .await
}

/// Roll back if a transaction is open. A no-op on a connection in autocommit mode.
pub(crate) fn rollback_if_open(conn: &rusqlite::Connection) -> Result<(), AdapterError> {
    if !conn.is_autocommit() {
        conn.execute_batch("ROLLBACK")?;
    }
    Ok(())
}

/// Roll back a dropped transaction, then let the connection return to its pool.
///
/// On failure the connection is detached from the pool and closed.
pub(crate) fn rollback_in_background(conn: SqlitePooledConnection) {
    fn rollback_or_detach(conn: SqlitePooledConnection) {
        let result = {
            let guard = conn.blocking_lock();
            rollback_if_open(&guard)
        };
        if let Err(e) = result {
            warn!(error = %e, "sqlite rollback of dropped transaction failed");
            drop(SqlitePooledConnection::take(conn));
        }
    }

    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(move || rollback_or_detach(conn));
        }
        Err(_) => rollback_or_detach(conn),
    }
}
