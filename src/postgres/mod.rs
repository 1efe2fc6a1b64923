// PostgreSQL backend - tokio-postgres clients pooled by deadpool-postgres
//
// This module is split into several sub-modules for better organization:
// - config: Pool options and construction
// - params: Parameter conversion between adapter and PostgreSQL types
// - query: Statement execution and row extraction
// - pool / connection / transaction / row: the adapter capabilities
//
// Postgres speaks the canonical `$N` placeholders natively, so SQL and arguments pass through
// unchanged. Dropping an in-flight future drops the request; tokio-postgres does not send a
// server-side cancel for it, so use `statement_timeout` when a hard deadline matters.

pub mod config;
pub mod connection;
pub mod params;
pub mod pool;
pub mod query;
pub mod row;
pub mod transaction;

pub use config::PgOptions;
pub use connection::PgConn;
pub use params::Params;
pub use pool::PgConnPool;
pub use transaction::PgTx;
