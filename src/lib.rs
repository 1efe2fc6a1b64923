//! Driver-neutral persistence boundary for a `PostgreSQL`-backed job queue.
//!
//! Queue logic is written once against the capability traits in [`adapter`] and runs on any
//! backend that implements them. Two backends ship with the crate, each behind a feature:
//!
//! - `postgres`: `tokio-postgres` clients pooled by `deadpool-postgres`
//! - `sqlite`: `rusqlite` connections pooled by `deadpool`
//!
//! ```rust,no_run
//! use queue_adapter::prelude::*;
//!
//! # async fn run() -> Result<(), AdapterError> {
//! let pool = SqliteOptionsBuilder::new("jobs.db").build().await?;
//! let tag = pool
//!     .execute(
//!         "update jobs set run_at = $1 where job_id = $2",
//!         &[RowValues::Text("2024-01-01 00:00:00".into()), RowValues::Int(7)],
//!     )
//!     .await?;
//! println!("{} job(s) rescheduled", tag.rows_affected());
//!
//! let mut queue = String::new();
//! match pool
//!     .query_row("select queue from jobs where job_id = $1", &[RowValues::Int(7)])
//!     .scan(&mut [&mut queue])
//!     .await
//! {
//!     Err(e) if e.is_no_rows() => println!("no such job"),
//!     other => other?,
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod error;
pub mod prelude;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use adapter::{Conn, ConnPool, Row, Tx};
pub use error::AdapterError;
pub use results::{CommandTag, ScanTarget, scan_into};
pub use translation::{PlaceholderStyle, align_args, translate_placeholders};
pub use types::{BackendKind, ParamConverter, RowValues};

/// Open a pool for `kind` with default options.
///
/// `target` is a connection URL for Postgres and a database path for `SQLite`.
///
/// # Errors
/// Returns `AdapterError::ConfigError` if the backend was not compiled in, otherwise the
/// backend's construction error.
pub async fn open_pool(kind: BackendKind, target: &str) -> Result<Box<dyn ConnPool>, AdapterError> {
    match kind {
        #[cfg(feature = "postgres")]
        BackendKind::Postgres => Ok(Box::new(postgres::PgOptions::from_url(target).build()?)),
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => Ok(Box::new(sqlite::SqliteOptions::new(target).build().await?)),
        #[allow(unreachable_patterns)]
        other => Err(AdapterError::ConfigError(format!(
            "backend {other:?} is not enabled in this build"
        ))),
    }
}
