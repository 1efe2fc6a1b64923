use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::adapter::{Conn, ConnPool, Row, Tx};
use crate::error::AdapterError;
use crate::results::CommandTag;
use crate::types::{BackendKind, RowValues};

use super::config::SqlitePool;
use super::connection::SqliteConn;
use super::executor::{control, execute_on};
use super::row::{SqliteExecutor, SqliteRow};
use super::transaction::SqliteTx;

/// A [`ConnPool`] over a deadpool-managed set of rusqlite connections. Cloning shares the pool.
#[derive(Clone)]
pub struct SqliteConnPool {
    pool: SqlitePool,
    begin_sql: &'static str,
}

impl fmt::Debug for SqliteConnPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnPool")
            .field("status", &self.pool.status())
            .field("begin_sql", &self.begin_sql)
            .finish()
    }
}

impl SqliteConnPool {
    pub(crate) fn new(pool: SqlitePool, begin_sql: &'static str) -> Self {
        Self { pool, begin_sql }
    }

    /// The underlying deadpool pool, for status and resizing.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ConnPool for SqliteConnPool {
    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn ping(&self) -> Result<(), AdapterError> {
        let conn = self.pool.get().await?;
        control(Arc::clone(&*conn), "SELECT 1").await
    }

    async fn begin(&self) -> Result<Box<dyn Tx>, AdapterError> {
        let conn = self.pool.get().await?;
        Ok(Box::new(SqliteTx::begin_owned(conn, self.begin_sql).await?))
    }

    async fn execute(&self, sql: &str, args: &[RowValues]) -> Result<CommandTag, AdapterError> {
        let conn = self.pool.get().await?;
        execute_on(Arc::clone(&*conn), sql, args).await
    }

    fn query_row<'a>(&'a self, sql: &str, args: &[RowValues]) -> Box<dyn Row + 'a> {
        Box::new(SqliteRow::new(SqliteExecutor::Pool(&self.pool), sql, args))
    }

    async fn acquire(&self) -> Result<Box<dyn Conn>, AdapterError> {
        let conn = self.pool.get().await?;
        debug!(status = ?self.pool.status(), "sqlite connection acquired");
        Ok(Box::new(SqliteConn::new(conn, self.begin_sql)))
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.pool.close();
        debug!("sqlite pool closed");
        Ok(())
    }
}
