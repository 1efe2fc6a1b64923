//! Driver-neutral capabilities the job queue programs against.
//!
//! Every backend implements the same five pieces: [`ConnPool`], [`Conn`], [`Tx`], [`Row`] and
//! [`CommandTag`]. SQL always uses canonical `$1, $2, …` placeholders with 1-indexed arguments;
//! backends rewrite both into their native form and report [`AdapterError::NoRows`] /
//! [`AdapterError::TxClosed`] in place of their own equivalents.
//!
//! Cancellation follows the usual async rule: dropping a returned future abandons the call. Whether
//! the database stops working on it depends on the backend, see the backend module docs.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::results::{CommandTag, ScanTarget};
use crate::types::{BackendKind, RowValues};

/// A deferred single-row query.
///
/// Creating a `Row` only captures the executor, SQL and arguments; the query runs when
/// [`scan`](Row::scan) is awaited. `scan` consumes the row, so each row result runs at most one
/// query.
#[async_trait]
pub trait Row: Send {
    /// Run the query and copy the first row into `dest`, one destination per column.
    ///
    /// # Errors
    /// Returns `AdapterError::NoRows` when the query yields nothing, `AdapterError::TxClosed` when
    /// the row came from a finished transaction, `AdapterError::ScanError` when the destinations do
    /// not fit the row, and the backend's own error otherwise.
    async fn scan(self: Box<Self>, dest: &mut [&mut dyn ScanTarget]) -> Result<(), AdapterError>;
}

/// A transaction that owns one backend transaction for its whole life.
///
/// `commit` and `rollback` are terminal. After either has been sent every call, including a
/// second `commit`/`rollback`, returns `AdapterError::TxClosed`. Dropping an open transaction
/// rolls it back.
#[async_trait]
pub trait Tx: Send {
    /// # Errors
    /// Returns `AdapterError::TxClosed` once the transaction is finished, otherwise the backend error.
    async fn execute(&mut self, sql: &str, args: &[RowValues]) -> Result<CommandTag, AdapterError>;

    fn query_row<'a>(&'a mut self, sql: &str, args: &[RowValues]) -> Box<dyn Row + 'a>;

    /// # Errors
    /// Returns `AdapterError::TxClosed` if already finished, otherwise the backend error.
    async fn commit(&mut self) -> Result<(), AdapterError>;

    /// # Errors
    /// Returns `AdapterError::TxClosed` if already finished, otherwise the backend error.
    async fn rollback(&mut self) -> Result<(), AdapterError>;
}

/// One connection leased from a pool.
///
/// A transaction begun here borrows the connection, and [`release`](Conn::release) consumes it,
/// so neither can be used after the lease ends.
#[async_trait]
pub trait Conn: Send {
    /// # Errors
    /// Returns the backend error when the server cannot be reached.
    async fn ping(&mut self) -> Result<(), AdapterError>;

    /// # Errors
    /// Returns the backend error if `BEGIN` fails.
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Tx + 'a>, AdapterError>;

    /// # Errors
    /// Returns the backend error if the statement fails.
    async fn execute(&mut self, sql: &str, args: &[RowValues]) -> Result<CommandTag, AdapterError>;

    fn query_row<'a>(&'a mut self, sql: &str, args: &[RowValues]) -> Box<dyn Row + 'a>;

    /// Hand the connection back to its pool.
    ///
    /// # Errors
    /// Returns the backend error if an abandoned transaction could not be rolled back; the
    /// connection is then discarded rather than returned.
    async fn release(self: Box<Self>) -> Result<(), AdapterError>;
}

/// The process-wide entry point, safe to share between tasks.
///
/// `ping`, `begin`, `execute` and `query_row` each borrow a pooled connection for that one call.
/// Use [`acquire`](ConnPool::acquire) to hold a connection across several calls.
#[async_trait]
pub trait ConnPool: Send + Sync {
    fn backend(&self) -> BackendKind;

    /// # Errors
    /// Returns `AdapterError::PoolClosed` after `close`, otherwise the backend error.
    async fn ping(&self) -> Result<(), AdapterError>;

    /// Begin a transaction on a connection it owns until commit or rollback.
    ///
    /// # Errors
    /// Returns `AdapterError::PoolClosed` after `close`, otherwise the backend error.
    async fn begin(&self) -> Result<Box<dyn Tx>, AdapterError>;

    /// # Errors
    /// Returns `AdapterError::PoolClosed` after `close`, otherwise the backend error.
    async fn execute(&self, sql: &str, args: &[RowValues]) -> Result<CommandTag, AdapterError>;

    fn query_row<'a>(&'a self, sql: &str, args: &[RowValues]) -> Box<dyn Row + 'a>;

    /// Lease a connection that stays checked out until released.
    ///
    /// # Errors
    /// Returns `AdapterError::PoolClosed` after `close`, otherwise the pool or backend error.
    async fn acquire(&self) -> Result<Box<dyn Conn>, AdapterError>;

    /// Stop handing out connections. Idle connections are closed now, leased ones when they come
    /// back.
    ///
    /// # Errors
    /// Reserved for backends whose shutdown can fail; the bundled backends always succeed.
    async fn close(&self) -> Result<(), AdapterError>;
}
