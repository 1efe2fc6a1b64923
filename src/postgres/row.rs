use async_trait::async_trait;
use deadpool_postgres::{ClientWrapper, Pool};

use crate::adapter::Row;
use crate::error::AdapterError;
use crate::results::{ScanTarget, scan_into};
use crate::types::RowValues;

use super::connection::PgConn;
use super::query::query_first;

/// Where a deferred row query will run.
pub(crate) enum PgExecutor<'a> {
    /// Check a connection out for the duration of the query.
    Pool(&'a Pool),
    /// A leased connection; any abandoned transaction is settled first.
    Conn(&'a mut PgConn),
    /// The client owned by an open transaction.
    Client(&'a ClientWrapper),
    /// A finished transaction.
    Closed,
}

/// A single-row query on Postgres, run when scanned.
pub struct PgRow<'a> {
    exec: PgExecutor<'a>,
    sql: String,
    args: Vec<RowValues>,
}

impl<'a> PgRow<'a> {
    pub(crate) fn new(exec: PgExecutor<'a>, sql: &str, args: &[RowValues]) -> Self {
        Self {
            exec,
            sql: sql.to_owned(),
            args: args.to_vec(),
        }
    }
}

#[async_trait]
impl Row for PgRow<'_> {
    async fn scan(self: Box<Self>, dest: &mut [&mut dyn ScanTarget]) -> Result<(), AdapterError> {
        let PgRow { exec, sql, args } = *self;
        let values = match exec {
            PgExecutor::Pool(pool) => {
                let client = pool.get().await?;
                query_first(&client, &sql, &args).await?
            }
            PgExecutor::Conn(conn) => {
                conn.settle().await?;
                query_first(conn.client()?, &sql, &args).await?
            }
            PgExecutor::Client(client) => query_first(client, &sql, &args).await?,
            PgExecutor::Closed => return Err(AdapterError::TxClosed),
        };
        scan_into(values, dest)
    }
}
