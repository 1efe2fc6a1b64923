use std::fmt;

use async_trait::async_trait;
use deadpool_postgres::Pool;
use tracing::debug;

use crate::adapter::{Conn, ConnPool, Row, Tx};
use crate::error::AdapterError;
use crate::results::CommandTag;
use crate::types::{BackendKind, RowValues};

use super::connection::PgConn;
use super::query::execute_on;
use super::row::{PgExecutor, PgRow};
use super::transaction::PgTx;

/// A [`ConnPool`] over a deadpool-postgres pool. Cloning shares the same pool.
#[derive(Clone)]
pub struct PgConnPool {
    pool: Pool,
}

impl fmt::Debug for PgConnPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnPool")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl PgConnPool {
    /// Wrap an already configured pool.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// The underlying deadpool pool, for status and resizing.
    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl ConnPool for PgConnPool {
    fn backend(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn ping(&self) -> Result<(), AdapterError> {
        let client = self.pool.get().await?;
        client.batch_execute("SELECT 1").await?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn Tx>, AdapterError> {
        let client = self.pool.get().await?;
        Ok(Box::new(PgTx::begin_owned(client).await?))
    }

    async fn execute(&self, sql: &str, args: &[RowValues]) -> Result<CommandTag, AdapterError> {
        let client = self.pool.get().await?;
        execute_on(&client, sql, args).await
    }

    fn query_row<'a>(&'a self, sql: &str, args: &[RowValues]) -> Box<dyn Row + 'a> {
        Box::new(PgRow::new(PgExecutor::Pool(&self.pool), sql, args))
    }

    async fn acquire(&self) -> Result<Box<dyn Conn>, AdapterError> {
        let client = self.pool.get().await?;
        debug!(status = ?self.pool.status(), "postgres connection acquired");
        Ok(Box::new(PgConn::new(client)))
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.pool.close();
        debug!("postgres pool closed");
        Ok(())
    }
}
