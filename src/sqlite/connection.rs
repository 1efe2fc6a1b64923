use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::adapter::{Conn, Row, Tx};
use crate::error::AdapterError;
use crate::results::CommandTag;
use crate::types::RowValues;

use super::config::{SharedSqliteConnection, SqlitePooledConnection};
use super::executor::{control, execute_on, rollback_if_open, rollback_in_background, run_blocking};
use super::row::{SqliteExecutor, SqliteRow};
use super::transaction::SqliteTx;

/// A connection leased from a [`SqliteConnPool`](super::SqliteConnPool).
pub struct SqliteConn {
    conn: Option<SqlitePooledConnection>,
    begin_sql: &'static str,
    rollback_pending: bool,
}

impl SqliteConn {
    pub(crate) fn new(conn: SqlitePooledConnection, begin_sql: &'static str) -> Self {
        Self {
            conn: Some(conn),
            begin_sql,
            rollback_pending: false,
        }
    }

    pub(crate) fn shared(&self) -> Result<SharedSqliteConnection, AdapterError> {
        self.conn
            .as_ref()
            .map(|conn| Arc::clone(&**conn))
            .ok_or_else(|| {
                AdapterError::ConnectionError("sqlite connection already released".to_string())
            })
    }

    pub(crate) fn mark_rollback_pending(&mut self) {
        self.rollback_pending = true;
    }

    /// Roll back a transaction that was dropped without commit or rollback.
    pub(crate) async fn settle(&mut self) -> Result<(), AdapterError> {
        if self.rollback_pending {
            run_blocking(self.shared()?, |c| rollback_if_open(c)).await?;
            self.rollback_pending = false;
            debug!("rolled back abandoned sqlite transaction");
        }
        Ok(())
    }
}

impl fmt::Debug for SqliteConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConn")
            .field("released", &self.conn.is_none())
            .field("rollback_pending", &self.rollback_pending)
            .finish()
    }
}

#[async_trait]
impl Conn for SqliteConn {
    async fn ping(&mut self) -> Result<(), AdapterError> {
        self.settle().await?;
        control(self.shared()?, "SELECT 1").await
    }

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Tx + 'a>, AdapterError> {
        self.settle().await?;
        // stays set if BEGIN fails or this future is dropped mid-flight
        self.rollback_pending = true;
        control(self.shared()?, self.begin_sql).await?;
        self.rollback_pending = false;
        debug!("sqlite transaction started on leased connection");
        Ok(Box::new(SqliteTx::borrowed(self)))
    }

    async fn execute(&mut self, sql: &str, args: &[RowValues]) -> Result<CommandTag, AdapterError> {
        self.settle().await?;
        execute_on(self.shared()?, sql, args).await
    }

    fn query_row<'a>(&'a mut self, sql: &str, args: &[RowValues]) -> Box<dyn Row + 'a> {
        Box::new(SqliteRow::new(SqliteExecutor::Conn(self), sql, args))
    }

    async fn release(self: Box<Self>) -> Result<(), AdapterError> {
        let mut conn = self;
        let settled = conn.settle().await;
        if let Some(pooled) = conn.conn.take() {
            if settled.is_err() {
                drop(SqlitePooledConnection::take(pooled));
            } else {
                drop(pooled);
            }
        }
        debug!(ok = settled.is_ok(), "sqlite connection released");
        settled
    }
}

impl Drop for SqliteConn {
    fn drop(&mut self) {
        if self.rollback_pending
            && let Some(conn) = self.conn.take()
        {
            rollback_in_background(conn);
        }
    }
}
