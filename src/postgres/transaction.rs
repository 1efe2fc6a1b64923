use async_trait::async_trait;
use deadpool_postgres::{ClientWrapper, Object};
use tracing::debug;

use crate::adapter::{Row, Tx};
use crate::error::AdapterError;
use crate::results::CommandTag;
use crate::types::RowValues;

use super::connection::{PgConn, rollback_in_background};
use super::query::execute_on;
use super::row::{PgExecutor, PgRow};

enum TxHandle<'a> {
    /// Begun from the pool; the client goes back once the transaction ends.
    Owned(Option<Object>),
    /// Begun on a leased connection.
    Borrowed(&'a mut PgConn),
}

/// An open Postgres transaction.
///
/// After `commit` or `rollback` every call returns [`AdapterError::TxClosed`]. Dropping it while
/// open rolls back: a pool-owned transaction rolls back on a background task, one borrowed from a
/// [`PgConn`] is rolled back before that connection's next use.
pub struct PgTx<'a> {
    handle: TxHandle<'a>,
    closed: bool,
}

impl PgTx<'static> {
    /// Start a transaction on a client checked out of the pool.
    ///
    /// # Errors
    /// Returns the driver error if `BEGIN` fails.
    pub(crate) async fn begin_owned(client: Object) -> Result<Self, AdapterError> {
        // Built before BEGIN so that a failed or abandoned start still rolls back on drop.
        let tx = Self {
            handle: TxHandle::Owned(Some(client)),
            closed: false,
        };
        tx.client()?.batch_execute("BEGIN").await?;
        debug!("postgres transaction started");
        Ok(tx)
    }
}

impl<'a> PgTx<'a> {
    /// Wrap a connection on which `BEGIN` has already run.
    pub(crate) fn borrowed(conn: &'a mut PgConn) -> Self {
        Self {
            handle: TxHandle::Borrowed(conn),
            closed: false,
        }
    }

    fn client(&self) -> Result<&ClientWrapper, AdapterError> {
        if self.closed {
            return Err(AdapterError::TxClosed);
        }
        match &self.handle {
            TxHandle::Owned(client) => client.as_deref().ok_or(AdapterError::TxClosed),
            TxHandle::Borrowed(conn) => conn.client(),
        }
    }

    /// Send `COMMIT` or `ROLLBACK`. The transaction counts as closed whatever the outcome.
    async fn finish(&mut self, sql: &str) -> Result<(), AdapterError> {
        let result = self.client()?.batch_execute(sql).await;
        self.closed = true;
        if let TxHandle::Owned(client) = &mut self.handle {
            client.take();
        }
        debug!(statement = sql, ok = result.is_ok(), "postgres transaction finished");
        result.map_err(AdapterError::from)
    }
}

#[async_trait]
impl Tx for PgTx<'_> {
    async fn execute(&mut self, sql: &str, args: &[RowValues]) -> Result<CommandTag, AdapterError> {
        execute_on(self.client()?, sql, args).await
    }

    fn query_row<'b>(&'b mut self, sql: &str, args: &[RowValues]) -> Box<dyn Row + 'b> {
        let exec = match self.client() {
            Ok(client) => PgExecutor::Client(client),
            Err(_) => PgExecutor::Closed,
        };
        Box::new(PgRow::new(exec, sql, args))
    }

    async fn commit(&mut self) -> Result<(), AdapterError> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), AdapterError> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for PgTx<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match &mut self.handle {
            TxHandle::Owned(client) => {
                if let Some(client) = client.take() {
                    rollback_in_background(client);
                }
            }
            TxHandle::Borrowed(conn) => conn.mark_rollback_pending(),
        }
    }
}
