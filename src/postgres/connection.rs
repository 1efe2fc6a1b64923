use std::fmt;

use async_trait::async_trait;
use deadpool_postgres::{ClientWrapper, Object};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::adapter::{Conn, Row, Tx};
use crate::error::AdapterError;
use crate::results::CommandTag;
use crate::types::RowValues;

use super::query::execute_on;
use super::row::{PgExecutor, PgRow};
use super::transaction::PgTx;

/// A connection leased from a [`PgConnPool`](super::PgConnPool).
pub struct PgConn {
    client: Option<Object>,
    rollback_pending: bool,
}

impl fmt::Debug for PgConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConn")
            .field("released", &self.client.is_none())
            .field("rollback_pending", &self.rollback_pending)
            .finish()
    }
}

impl PgConn {
    pub(crate) fn new(client: Object) -> Self {
        Self {
            client: Some(client),
            rollback_pending: false,
        }
    }

    pub(crate) fn client(&self) -> Result<&ClientWrapper, AdapterError> {
        self.client.as_deref().ok_or_else(|| {
            AdapterError::ConnectionError("postgres connection already released".to_string())
        })
    }

    /// Called when a transaction borrowed from this connection is dropped while still open.
    pub(crate) fn mark_rollback_pending(&mut self) {
        self.rollback_pending = true;
    }

    /// Roll back a transaction that was dropped without commit or rollback.
    pub(crate) async fn settle(&mut self) -> Result<(), AdapterError> {
        if self.rollback_pending {
            self.client()?.batch_execute("ROLLBACK").await?;
            self.rollback_pending = false;
            debug!("rolled back abandoned postgres transaction");
        }
        Ok(())
    }
}

#[async_trait]
impl Conn for PgConn {
    async fn ping(&mut self) -> Result<(), AdapterError> {
        self.settle().await?;
        self.client()?.batch_execute("SELECT 1").await?;
        Ok(())
    }

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Tx + 'a>, AdapterError> {
        self.settle().await?;
        // stays set if BEGIN fails or this future is dropped mid-flight
        self.rollback_pending = true;
        self.client()?.batch_execute("BEGIN").await?;
        self.rollback_pending = false;
        debug!("postgres transaction started on leased connection");
        Ok(Box::new(PgTx::borrowed(self)))
    }

    async fn execute(&mut self, sql: &str, args: &[RowValues]) -> Result<CommandTag, AdapterError> {
        self.settle().await?;
        execute_on(self.client()?, sql, args).await
    }

    fn query_row<'a>(&'a mut self, sql: &str, args: &[RowValues]) -> Box<dyn Row + 'a> {
        Box::new(PgRow::new(PgExecutor::Conn(self), sql, args))
    }

    async fn release(self: Box<Self>) -> Result<(), AdapterError> {
        let mut conn = self;
        let settled = conn.settle().await;
        if let Some(client) = conn.client.take() {
            if settled.is_err() {
                // never hand a connection stuck in a transaction back to the pool
                drop(Object::take(client));
            } else {
                drop(client);
            }
        }
        debug!(ok = settled.is_ok(), "postgres connection released");
        settled
    }
}

impl Drop for PgConn {
    fn drop(&mut self) {
        if self.rollback_pending
            && let Some(client) = self.client.take()
        {
            rollback_in_background(client);
        }
    }
}

/// Roll back on a detached task, then let the client return to its pool.
///
/// Without a runtime, or if the rollback fails, the connection is detached from the pool and
/// closed instead.
pub(crate) fn rollback_in_background(client: Object) {
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = client.batch_execute("ROLLBACK").await {
                    warn!(error = %e, "postgres rollback of dropped transaction failed");
                    drop(Object::take(client));
                }
            });
        }
        Err(_) => {
            warn!("no tokio runtime to roll back dropped postgres transaction; closing connection");
            drop(Object::take(client));
        }
    }
}
