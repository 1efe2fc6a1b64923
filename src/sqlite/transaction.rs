use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::adapter::{Row, Tx};
use crate::error::AdapterError;
use crate::results::CommandTag;
use crate::types::RowValues;

use super::config::{SharedSqliteConnection, SqlitePooledConnection};
use super::connection::SqliteConn;
use super::executor::{control, execute_on, rollback_in_background};
use super::row::{SqliteExecutor, SqliteRow};

enum TxHandle<'a> {
    Owned(Option<SqlitePooledConnection>),
    Borrowed(&'a mut SqliteConn),
}

/// An open `SQLite` transaction.
///
/// Dropping it while open rolls back: on a blocking task for a pool-owned transaction, before the
/// next use for one borrowed from a [`SqliteConn`].
pub struct SqliteTx<'a> {
    handle: TxHandle<'a>,
    closed: bool,
}

impl SqliteTx<'static> {
    pub(crate) async fn begin_owned(
        conn: SqlitePooledConnection,
        begin_sql: &'static str,
    ) -> Result<Self, AdapterError> {
        let tx = Self {
            handle: TxHandle::Owned(Some(conn)),
            closed: false,
        };
        control(tx.shared()?, begin_sql).await?;
        debug!("sqlite transaction started");
        Ok(tx)
    }
}

impl<'a> SqliteTx<'a> {
    pub(crate) fn borrowed(conn: &'a mut SqliteConn) -> Self {
        Self {
            handle: TxHandle::Borrowed(conn),
            closed: false,
        }
    }

    fn shared(&self) -> Result<SharedSqliteConnection, AdapterError> {
        if self.closed {
            return Err(AdapterError::TxClosed);
        }
        match &self.handle {
            TxHandle::Owned(conn) => conn
                .as_ref()
                .map(|conn| Arc::clone(&**conn))
                .ok_or(AdapterError::TxClosed),
            TxHandle::Borrowed(conn) => conn.shared(),
        }
    }

    async fn finish(&mut self, sql: &'static str) -> Result<(), AdapterError> {
        let result = control(self.shared()?, sql).await;
        self.closed = true;
        match &mut self.handle {
            // a failed COMMIT can leave the transaction open; don't pool it like that
            TxHandle::Owned(conn) => {
                if let Some(conn) = conn.take()
                    && result.is_err()
                {
                    rollback_in_background(conn);
                }
            }
            TxHandle::Borrowed(conn) => {
                if result.is_err() {
                    conn.mark_rollback_pending();
                }
            }
        }
        debug!(statement = sql, ok = result.is_ok(), "sqlite transaction finished");
        result
    }
}

#[async_trait]
impl Tx for SqliteTx<'_> {
    async fn execute(&mut self, sql: &str, args: &[RowValues]) -> Result<CommandTag, AdapterError> {
        execute_on(self.shared()?, sql, args).await
    }

    fn query_row<'b>(&'b mut self, sql: &str, args: &[RowValues]) -> Box<dyn Row + 'b> {
        let exec = match self.shared() {
            Ok(conn) => SqliteExecutor::Shared(conn),
            Err(_) => SqliteExecutor::Closed,
        };
        Box::new(SqliteRow::new(exec, sql, args))
    }

    async fn commit(&mut self) -> Result<(), AdapterError> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), AdapterError> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for SqliteTx<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match &mut self.handle {
            TxHandle::Owned(conn) => {
                if let Some(conn) = conn.take() {
                    rollback_in_background(conn);
                }
            }
            TxHandle::Borrowed(conn) => conn.mark_rollback_pending(),
        }
    }
}
