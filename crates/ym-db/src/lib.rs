//! ym-db - Database abstraction layer for Yam
//!
//! This crate provides the synchronous [`Database`] trait the migration
//! engine runs against, its DuckDB implementation, live schema
//! introspection, and the [`SchemaDiffer`] capability that turns two
//! schemas into DDL.

pub mod duckdb_backend;
pub mod error;
pub(crate) mod introspect;
pub mod platform;
pub mod traits;

pub use duckdb_backend::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use platform::{quote_identifier, DuckDbPlatform};
pub use traits::{with_transaction, Database, SchemaChanges, SchemaDiffer};
