// SQLite module - rusqlite connections pooled by deadpool
//
// This module is split into several sub-modules for better organization:
// - config: Connection manager, options and pool setup
// - params: Parameter conversion between adapter and SQLite types
// - query: Result extraction
// - executor: Statement execution on blocking threads
// - pool / connection / transaction / row: the adapter capabilities
//
// rusqlite is synchronous, so every statement runs on tokio's blocking pool. Dropping a future
// abandons the wait, but a statement already running finishes in the background; its connection
// stays checked out until it does. Use `busy_timeout` to bound lock waits.

pub mod config;
pub mod connection;
pub mod executor;
pub mod params;
pub mod pool;
pub mod query;
pub mod row;
pub mod transaction;

// Re-export the public API
pub use config::{SqliteManager, SqliteOptions, SqliteOptionsBuilder, SqlitePool};
pub use connection::SqliteConn;
pub use params::Params;
pub use pool::SqliteConnPool;
pub use transaction::SqliteTx;
