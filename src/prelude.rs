//! Convenient imports for common functionality.
//!
//! This module re-exports the capability traits, the value and error types, and the bundled
//! backends' pools and options.

pub use crate::adapter::{Conn, ConnPool, Row, Tx};
pub use crate::error::AdapterError;
pub use crate::results::{CommandTag, ScanTarget, scan_into};
pub use crate::translation::{PlaceholderStyle, align_args, translate_placeholders};
pub use crate::types::{BackendKind, RowValues};
pub use crate::open_pool;

#[cfg(feature = "postgres")]
pub use crate::postgres::{PgConnPool, PgOptions};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnPool, SqliteOptions, SqliteOptionsBuilder};
