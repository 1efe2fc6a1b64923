use thiserror::Error;

/// Errors surfaced by every backend.
///
/// [`AdapterError::NoRows`] and [`AdapterError::TxClosed`] are the two sentinels callers may
/// branch on. Backends translate their native equivalents into them; every other failure is
/// carried through untouched inside one of the wrapping variants, so its message and source chain
/// stay available for diagnostics.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A single-row query produced no rows.
    #[error("no rows in result set")]
    NoRows,

    /// The transaction was already committed or rolled back.
    #[error("transaction has already been committed or rolled back")]
    TxClosed,

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolErrorPostgres(deadpool_postgres::PoolError),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(rusqlite::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    PoolErrorSqlite(deadpool::managed::PoolError<rusqlite::Error>),

    #[error("connection pool is closed")]
    PoolClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Scan error: {0}")]
    ScanError(String),
}

impl AdapterError {
    /// True for the no-rows sentinel.
    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        matches!(self, AdapterError::NoRows)
    }

    /// True for the transaction-closed sentinel.
    #[must_use]
    pub fn is_tx_closed(&self) -> bool {
        matches!(self, AdapterError::TxClosed)
    }
}

pub type Result<T, E = AdapterError> = std::result::Result<T, E>;

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for AdapterError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => AdapterError::NoRows,
            other => AdapterError::SqliteError(other),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<deadpool_postgres::PoolError> for AdapterError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Closed => AdapterError::PoolClosed,
            deadpool_postgres::PoolError::Backend(e) => AdapterError::PostgresError(e),
            other => AdapterError::PoolErrorPostgres(other),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<deadpool::managed::PoolError<rusqlite::Error>> for AdapterError {
    fn from(err: deadpool::managed::PoolError<rusqlite::Error>) -> Self {
        match err {
            deadpool::managed::PoolError::Closed => AdapterError::PoolClosed,
            deadpool::managed::PoolError::Backend(e) => AdapterError::from(e),
            other => AdapterError::PoolErrorSqlite(other),
        }
    }
}
