use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::Row;
use crate::error::AdapterError;
use crate::results::{ScanTarget, scan_into};
use crate::types::RowValues;

use super::config::{SharedSqliteConnection, SqlitePool};
use super::connection::SqliteConn;
use super::executor::query_first;

pub(crate) enum SqliteExecutor<'a> {
    Pool(&'a SqlitePool),
    Conn(&'a mut SqliteConn),
    /// The connection of an open transaction.
    Shared(SharedSqliteConnection),
    Closed,
}

/// A single-row query on `SQLite`, run when scanned.
pub struct SqliteRow<'a> {
    exec: SqliteExecutor<'a>,
    sql: String,
    args: Vec<RowValues>,
}

impl<'a> SqliteRow<'a> {
    pub(crate) fn new(exec: SqliteExecutor<'a>, sql: &str, args: &[RowValues]) -> Self {
        Self {
            exec,
            sql: sql.to_owned(),
            args: args.to_vec(),
        }
    }
}

#[async_trait]
impl Row for SqliteRow<'_> {
    async fn scan(self: Box<Self>, dest: &mut [&mut dyn ScanTarget]) -> Result<(), AdapterError> {
        let SqliteRow { exec, sql, args } = *self;
        let values = match exec {
            SqliteExecutor::Pool(pool) => {
                let conn = pool.get().await?;
                query_first(Arc::clone(&*conn), &sql, &args).await?
            }
            SqliteExecutor::Conn(conn) => {
                conn.settle().await?;
                query_first(conn.shared()?, &sql, &args).await?
            }
            SqliteExecutor::Shared(conn) => query_first(conn, &sql, &args).await?,
            SqliteExecutor::Closed => return Err(AdapterError::TxClosed),
        };
        scan_into(values, dest)
    }
}
