use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use deadpool::Runtime;
use deadpool::managed::{Manager, Metrics, Object, Pool, RecycleError, RecycleResult};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AdapterError;

use super::SqliteConnPool;

/// A pooled rusqlite connection, shared with blocking tasks.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;
pub type SqlitePool = Pool<SqliteManager>;
pub type SqlitePooledConnection = Object<SqliteManager>;

const MEMORY_PATH: &str = ":memory:";

/// `SQLite` connection manager for deadpool
pub struct SqliteManager {
    path: String,
    busy_timeout: Duration,
    wal: bool,
}

impl fmt::Debug for SqliteManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteManager")
            .field("path", &self.path)
            .field("busy_timeout", &self.busy_timeout)
            .field("wal", &self.wal)
            .finish()
    }
}

impl Manager for SqliteManager {
    type Type = SharedSqliteConnection;
    type Error = rusqlite::Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        let conn = rusqlite::Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        if self.wal {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            debug!(path = %self.path, journal_mode = %mode, "opened sqlite connection");
        }
        Ok(Arc::new(Mutex::new(conn)))
    }

    async fn recycle(&self, conn: &mut Self::Type, _metrics: &Metrics) -> RecycleResult<Self::Error> {
        let guard = conn.lock().await;
        if !guard.is_autocommit() {
            debug!("rolling back transaction left open on recycled sqlite connection");
            guard.execute_batch("ROLLBACK").map_err(RecycleError::Backend)?;
        }
        Ok(())
    }
}

/// Options for configuring a `SQLite` pool.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub db_path: String,
    pub max_size: usize,
    pub busy_timeout: Duration,
    pub wal: bool,
    pub wait_timeout: Option<Duration>,
    /// Start transactions with `BEGIN IMMEDIATE`, taking the write lock up front.
    pub immediate_transactions: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            max_size: 8,
            busy_timeout: Duration::from_secs(5),
            wal: true,
            wait_timeout: None,
            immediate_transactions: true,
        }
    }

    fn validate(&self) -> Result<(), AdapterError> {
        if self.db_path.is_empty() {
            return Err(AdapterError::ConfigError(
                "sqlite database path is required".to_string(),
            ));
        }
        if self.max_size == 0 {
            return Err(AdapterError::ConfigError(
                "max_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a [`SqliteConnPool`] from these options.
    ///
    /// # Errors
    /// See [`SqliteConnPool::connect`].
    pub async fn build(self) -> Result<SqliteConnPool, AdapterError> {
        SqliteConnPool::connect(self).await
    }

    pub(crate) fn begin_sql(&self) -> &'static str {
        if self.immediate_transactions {
            "BEGIN IMMEDIATE"
        } else {
            "BEGIN"
        }
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.opts.max_size = max_size;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.opts.busy_timeout = busy_timeout;
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.opts.wait_timeout = Some(wait_timeout);
        self
    }

    #[must_use]
    pub fn immediate_transactions(mut self, immediate: bool) -> Self {
        self.opts.immediate_transactions = immediate;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build a [`SqliteConnPool`].
    ///
    /// # Errors
    ///
    /// Returns `AdapterError` if the options are invalid, pool creation fails, or the first
    /// connection cannot be opened.
    pub async fn build(self) -> Result<SqliteConnPool, AdapterError> {
        SqliteConnPool::connect(self.finish()).await
    }
}

impl SqliteConnPool {
    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    /// Create the pool and open one connection to surface path and pragma errors early.
    ///
    /// Every connection to `:memory:` is a separate database, so an in-memory pool is capped at
    /// one connection.
    ///
    /// # Errors
    /// Returns `AdapterError::ConfigError` for invalid options, `AdapterError::ConnectionError` if
    /// the pool cannot be built, or the `SQLite` error raised opening the first connection.
    pub async fn connect(opts: SqliteOptions) -> Result<Self, AdapterError> {
        opts.validate()?;

        let max_size = if opts.db_path == MEMORY_PATH {
            1
        } else {
            opts.max_size
        };
        let begin_sql = opts.begin_sql();
        let manager = SqliteManager {
            path: opts.db_path,
            busy_timeout: opts.busy_timeout,
            wal: opts.wal,
        };

        let pool = Pool::builder(manager)
            .max_size(max_size)
            .wait_timeout(opts.wait_timeout)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| {
                AdapterError::ConnectionError(format!("Failed to create SQLite pool: {e}"))
            })?;

        // smoke test
        drop(pool.get().await?);

        Ok(Self::new(pool, begin_sql))
    }
}
